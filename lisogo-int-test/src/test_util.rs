use lisogo::database::Database;
use lisogo::entity::{EntityRef, TypeRegistry};
use lisogo::errors::OdmResult;
use lisogo::store::memory::InMemoryStore;
use lisogo::store::Store;
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::thread;

use crate::models::{model_registry, Note};

/// Runs a test between a setup and a teardown step.
///
/// A failing attempt is retried a few times before the test panics with the
/// last error seen.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> OdmResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> OdmResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> OdmResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => match after(ctx) {
                        Ok(_) => Ok(()),
                        Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                    },
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    thread::sleep(Duration::from_millis(10 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                eprintln!(
                    "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                    attempt, MAX_RETRIES, elapsed
                );
                eprintln!("{}", err_msg);
                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = None;
                if attempt < MAX_RETRIES {
                    thread::sleep(Duration::from_millis(10 * attempt as u64));
                }
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    name: String,
    db: Database,
}

impl TestContext {
    pub fn new(name: String, db: Database) -> Self {
        Self { name, db }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }
}

/// A database name that no other test uses.
pub fn random_name() -> String {
    format!("db_{}", uuid::Uuid::new_v4().simple())
}

/// Opens a fresh database over its own in-memory store, with the models
/// registered.
pub fn create_test_context() -> OdmResult<TestContext> {
    let name = random_name();
    let db = Database::builder()
        .name(&name)
        .registry(model_registry())
        .open()?;
    Ok(TestContext::new(name, db))
}

/// Like [create_test_context], with references resolved lazily.
pub fn create_lazy_test_context() -> OdmResult<TestContext> {
    let name = random_name();
    let db = Database::builder()
        .name(&name)
        .registry(model_registry())
        .lazy_loading(true)
        .open()?;
    Ok(TestContext::new(name, db))
}

/// Like [create_test_context], with identity caching turned off.
pub fn create_uncached_test_context() -> OdmResult<TestContext> {
    let name = random_name();
    let db = Database::builder()
        .name(&name)
        .registry(model_registry())
        .cache(false)
        .open()?;
    Ok(TestContext::new(name, db))
}

/// Opens a second database over the store of `ctx`.
pub fn open_sibling(ctx: &TestContext, registry: TypeRegistry) -> OdmResult<Database> {
    Database::builder()
        .name(ctx.name())
        .store(ctx.db().store().clone())
        .registry(registry)
        .open()
}

/// Opens a database over a caller-provided store.
pub fn open_with_store(store: Store) -> OdmResult<Database> {
    Database::builder()
        .name(&random_name())
        .store(store)
        .registry(model_registry())
        .open()
}

pub fn new_store() -> Store {
    Store::new(InMemoryStore::new())
}

/// Saves `count` generated notes and returns their handles.
pub fn insert_test_notes(db: &Database, count: usize) -> OdmResult<Vec<EntityRef>> {
    let mut notes = Vec::with_capacity(count);
    for _ in 0..count {
        let note = EntityRef::new(Note::generate());
        note.save(db)?;
        notes.push(note);
    }
    Ok(notes)
}

pub fn cleanup(ctx: TestContext) -> OdmResult<()> {
    ctx.db().close()
}
