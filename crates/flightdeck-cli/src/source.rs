//! Where a command gets its flight from: a JSON log or the generator.

use anyhow::{Context, Result};
use clap::Args;
use flightdeck_core::{FlightSession, MockFlight};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct SessionSource {
    /// Flight log as JSON; overrides --seed
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Seed for a generated flight
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
}

impl SessionSource {
    pub fn load(&self) -> Result<FlightSession> {
        let Some(path) = &self.file else {
            return Ok(MockFlight::new(self.seed).generate());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let session: FlightSession =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_generates_session() {
        let source = SessionSource { file: None, seed: 12 };
        assert_eq!(source.load().unwrap(), MockFlight::new(12).generate());
    }

    #[test]
    fn file_round_trips_and_validates() {
        let path = std::env::temp_dir().join(format!("flightdeck-source-{}.json", std::process::id()));
        let session = MockFlight::new(3).generate();
        std::fs::write(&path, serde_json::to_string(&session).unwrap()).unwrap();

        let source = SessionSource { file: Some(path.clone()), seed: 99 };
        assert_eq!(source.load().unwrap(), session);

        let mut broken = session;
        broken.flight_id.clear();
        std::fs::write(&path, serde_json::to_string(&broken).unwrap()).unwrap();
        assert!(source.load().is_err());

        let _ = std::fs::remove_file(&path);
    }
}
