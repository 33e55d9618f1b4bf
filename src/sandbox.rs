//! Start/stop of the local sandbox database server.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};

/// Owns the sandbox child process for the duration of the run.
///
/// Dropping the guard kills the process, so the server goes away on
/// every exit path, panics included. Stop failures are logged and never
/// block shutdown.
pub struct Sandbox {
    child: Option<Child>,
}

impl Sandbox {
    /// Launches `java -jar <jar>` if the jar file is present. A missing
    /// jar means the server is managed externally, which is fine.
    pub fn start_if_present(jar: &str) -> std::io::Result<Sandbox> {
        if !Path::new(jar).exists() {
            info!(
                "sandbox jar '{}' not found; assuming the server is already running",
                jar
            );
            return Ok(Sandbox { child: None });
        }

        println!("Starting {}...", jar);
        let child = Command::new("java")
            .arg("-jar")
            .arg(jar)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!("sandbox started, pid {}", child.id());
        Ok(Sandbox { child: Some(child) })
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                warn!("could not stop sandbox process: {}", err);
            }
            let _ = child.wait();
        }
    }
}
