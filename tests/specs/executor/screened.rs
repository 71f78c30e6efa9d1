//! Screened executor specs
//!
//! Verify that every default-executor entry point of a factory and its
//! `Cffu`s runs on the executor the factory was built with.

use crate::prelude::*;
use crate::prelude::assert_eq;
use cffu::Supplier;

#[test]
fn async_entry_points_submit_to_factory_executor() {
    let fake = FakeExecutor::new();
    let factory = CffuFactory::new(fake.shared());

    let supplied = factory.supply_async(|| 1);
    let mapped = supplied.then_apply_async(|v| v + 1);
    let handled = mapped.handle_async(|outcome| outcome.is_ok());
    let suppliers: Vec<Supplier<i32>> = vec![Box::new(|| 3), Box::new(|| 4)];
    let multi = factory.m_supply_async(suppliers);

    let ran = fake.run_all();
    assert!(ran >= 5, "only {ran} tasks reached the factory executor");

    assert_eq!(mapped.result_now().unwrap(), 2);
    assert!(handled.result_now().unwrap());
    assert_eq!(multi.result_now().unwrap(), vec![3, 4]);
    assert_eq!(fake.pending(), 0);
}

#[test]
fn callbacks_run_on_named_factory_threads() {
    let factory = CffuFactory::new(threads("screened-pool"));

    let name = factory
        .completed(1)
        .then_apply_async(|_| thread_name())
        .join_timeout(WAIT)
        .unwrap();
    assert_eq!(name.as_deref(), Some("screened-pool"));

    let name = factory
        .new_incomplete::<i32>()
        .complete_on_timeout(0, Duration::from_millis(10))
        .unwrap()
        .then_apply(|_| thread_name())
        .join_timeout(WAIT)
        .unwrap();
    assert_eq!(name.as_deref(), Some("screened-pool"));
}

#[tokio::test]
async fn tokio_executor_drives_factory() {
    let executor: SharedExecutor = Arc::new(cffu_adapters::TokioExecutor::try_current().unwrap());
    let factory = CffuFactory::new(executor);

    let value = factory.supply_async(|| 6 * 7).await.unwrap();
    assert_eq!(value, 42);
}
