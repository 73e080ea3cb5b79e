//! Configuration of a database.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_DATABASE_NAME, DEFAULT_NAMESPACE};
use crate::errors::{ErrorKind, OdmError, OdmResult};

/// Plain, serializable values of a [DatabaseConfig].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub name: String,
    pub namespace: String,
    pub cache_enabled: bool,
    pub lazy_loading: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            name: DEFAULT_DATABASE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            cache_enabled: true,
            lazy_loading: false,
        }
    }
}

/// Configuration of a database.
///
/// The values are fixed once the database is opened: every setter then
/// fails with [ErrorKind::InvalidOperation]. `cache_enabled` and
/// `lazy_loading` are the initial states; both can be toggled on the open
/// [Database](crate::database::Database).
#[derive(Clone, Default)]
pub struct DatabaseConfig {
    inner: Arc<DatabaseConfigInner>,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new(DatabaseSettings::default())),
        }
    }

    pub fn from_settings(settings: DatabaseSettings) -> OdmResult<Self> {
        validate_name(&settings.name)?;
        validate_namespace(&settings.namespace)?;
        Ok(DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new(settings)),
        })
    }

    pub fn name(&self) -> String {
        self.inner.settings.read_with(|it| it.name.clone())
    }

    pub fn set_name(&self, name: &str) -> OdmResult<()> {
        self.inner.check_not_configured("database name")?;
        validate_name(name)?;
        self.inner.settings.write_with(|it| it.name = name.to_string());
        Ok(())
    }

    /// The namespace of the type registry created for the database.
    pub fn namespace(&self) -> String {
        self.inner.settings.read_with(|it| it.namespace.clone())
    }

    pub fn set_namespace(&self, namespace: &str) -> OdmResult<()> {
        self.inner.check_not_configured("namespace")?;
        validate_namespace(namespace)?;
        self.inner.settings.write_with(|it| it.namespace = namespace.to_string());
        Ok(())
    }

    pub fn cache_enabled(&self) -> bool {
        self.inner.settings.read_with(|it| it.cache_enabled)
    }

    pub fn set_cache_enabled(&self, enabled: bool) -> OdmResult<()> {
        self.inner.check_not_configured("cache setting")?;
        self.inner.settings.write_with(|it| it.cache_enabled = enabled);
        Ok(())
    }

    pub fn lazy_loading(&self) -> bool {
        self.inner.settings.read_with(|it| it.lazy_loading)
    }

    pub fn set_lazy_loading(&self, enabled: bool) -> OdmResult<()> {
        self.inner.check_not_configured("lazy loading setting")?;
        self.inner.settings.write_with(|it| it.lazy_loading = enabled);
        Ok(())
    }

    pub fn settings(&self) -> DatabaseSettings {
        self.inner.settings.read_with(|it| it.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    pub(crate) fn initialize(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.settings())
    }
}

struct DatabaseConfigInner {
    configured: AtomicBool,
    settings: Atomic<DatabaseSettings>,
}

impl DatabaseConfigInner {
    fn new(settings: DatabaseSettings) -> Self {
        DatabaseConfigInner {
            configured: AtomicBool::from(false),
            settings: atomic(settings),
        }
    }

    fn check_not_configured(&self, what: &str) -> OdmResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("The {} cannot be changed after the database is opened", what);
            return Err(OdmError::new(
                &format!("The {} cannot be changed after the database is opened", what),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

impl Default for DatabaseConfigInner {
    fn default() -> Self {
        DatabaseConfigInner::new(DatabaseSettings::default())
    }
}

fn validate_name(name: &str) -> OdmResult<()> {
    if name.is_empty() || name.contains(['.', '$', '\0']) {
        log::error!("Invalid database name {:?}", name);
        return Err(OdmError::new(
            &format!("Invalid database name {:?}", name),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

fn validate_namespace(namespace: &str) -> OdmResult<()> {
    if namespace.is_empty() {
        log::error!("Type namespace cannot be empty");
        return Err(OdmError::new(
            "Type namespace cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}
