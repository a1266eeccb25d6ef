//! EPICS Channel Access client
//!
//! Process variables are read and written through the `caget` / `caput`
//! tools shipped with EPICS base. Each call runs as a child process with a
//! timeout so a disconnected PV never stalls the event loop.

use crate::domain::settings::{ChannelAccessSettings, Settings};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, trace};

/// Extra time granted to the tool on top of its own `-w` wait
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// Used when the configured timeout is not a usable duration
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Significant digits requested from caget so values are not cut to the
/// record's display precision
const GET_PRECISION: &str = "17";

#[derive(Debug, Error)]
pub enum PvError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out accessing {name}")]
    Timeout { name: String },
    #[error("{name}: {message}")]
    Failed { name: String, message: String },
}

/// Synchronous-style get/put by name against the control system
#[async_trait]
pub trait ProcessVariableClient: Send + Sync {
    async fn get(&self, name: &str) -> Result<String, PvError>;
    async fn put(&self, name: &str, value: &str) -> Result<(), PvError>;
}

/// Client backed by the Channel Access command line tools
pub struct CaToolClient {
    caget: String,
    caput: String,
    timeout: Duration,
}

impl CaToolClient {
    pub fn new(settings: &ChannelAccessSettings) -> Self {
        Self {
            caget: settings.caget.clone(),
            caput: settings.caput.clone(),
            timeout: Duration::try_from_secs_f64(
                settings.timeout_secs.min(Settings::MAX_CA_TIMEOUT_SECS),
            )
            .unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    fn wait_arg(&self) -> String {
        self.timeout.as_secs_f64().to_string()
    }

    async fn run(&self, program: &str, name: &str, args: &[&str]) -> Result<String, PvError> {
        trace!("{} {:?}", program, args);

        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout + PROCESS_GRACE, command.output())
            .await
            .map_err(|_| PvError::Timeout {
                name: name.to_string(),
            })?
            .map_err(|source| PvError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PvError::Failed {
                name: name.to_string(),
                message,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(['\r', '\n'])
            .to_string())
    }
}

#[async_trait]
impl ProcessVariableClient for CaToolClient {
    async fn get(&self, name: &str) -> Result<String, PvError> {
        let wait = self.wait_arg();
        let value = self
            .run(
                &self.caget,
                name,
                &[
                    "-t",
                    "-g",
                    GET_PRECISION,
                    "-w",
                    wait.as_str(),
                    "--",
                    name,
                ],
            )
            .await?;
        debug!("caget {} -> {:?}", name, value);
        Ok(value)
    }

    async fn put(&self, name: &str, value: &str) -> Result<(), PvError> {
        let wait = self.wait_arg();
        self.run(&self.caput, name, &["-t", "-w", wait.as_str(), "--", name, value])
            .await?;
        debug!("caput {} <- {:?}", name, value);
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory client for tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryClient {
        values: Mutex<HashMap<String, String>>,
        puts: Mutex<Vec<(String, String)>>,
    }

    impl MemoryClient {
        pub fn with(values: &[(&str, &str)]) -> Self {
            let client = Self::default();
            for (name, value) in values {
                client.set(name, value);
            }
            client
        }

        pub fn set(&self, name: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(name.to_string(), value.to_string());
        }

        pub fn puts(&self) -> Vec<(String, String)> {
            self.puts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessVariableClient for MemoryClient {
        async fn get(&self, name: &str) -> Result<String, PvError> {
            self.values
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| PvError::Failed {
                    name: name.to_string(),
                    message: "not found".to_string(),
                })
        }

        async fn put(&self, name: &str, value: &str) -> Result<(), PvError> {
            if !self.values.lock().unwrap().contains_key(name) {
                return Err(PvError::Failed {
                    name: name.to_string(),
                    message: "not found".to_string(),
                });
            }
            self.set(name, value);
            self.puts
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(caget: &str, caput: &str) -> CaToolClient {
        CaToolClient::new(&ChannelAccessSettings {
            caget: caget.to_string(),
            caput: caput.to_string(),
            timeout_secs: 1.0,
        })
    }

    #[tokio::test]
    async fn test_missing_tool_reports_spawn_error() {
        let client = client("/nonexistent/caget", "/nonexistent/caput");
        let err = client.get("IOC:m1.RBV").await.unwrap_err();
        assert!(matches!(err, PvError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_get_returns_tool_output() {
        // `echo` prints its arguments, standing in for caget
        let client = client("echo", "true");
        let value = client.get("IOC:m1.RBV").await.unwrap();
        assert_eq!(value, "-t -g 17 -w 1 -- IOC:m1.RBV");
    }

    #[test]
    fn test_out_of_range_timeout_does_not_panic() {
        for timeout_secs in [1e30, f64::INFINITY, f64::NAN, -5.0] {
            let client = CaToolClient::new(&ChannelAccessSettings {
                timeout_secs,
                ..Default::default()
            });
            assert!(client.timeout <= Duration::from_secs_f64(Settings::MAX_CA_TIMEOUT_SECS));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_reports_failure() {
        let client = client("false", "false");
        let err = client.put("IOC:m1.VAL", "1.0").await.unwrap_err();
        assert!(matches!(err, PvError::Failed { ref name, .. } if name == "IOC:m1.VAL"));
    }

    #[tokio::test]
    async fn test_memory_client() {
        let client = memory::MemoryClient::with(&[("IOC:m1.VAL", "0")]);
        client.put("IOC:m1.VAL", "2.5").await.unwrap();
        assert_eq!(client.get("IOC:m1.VAL").await.unwrap(), "2.5");
        assert!(client.put("IOC:m9.VAL", "1").await.is_err());
        assert_eq!(
            client.puts(),
            vec![("IOC:m1.VAL".to_string(), "2.5".to_string())]
        );
    }
}
