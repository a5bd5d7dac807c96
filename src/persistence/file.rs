use super::PersistenceResult;
use crate::project::ProjectSnapshot;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &ProjectSnapshot,
    path: P,
) -> PersistenceResult<()> {
    super::validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectSnapshot> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(BufReader::new(file))?;
    super::validate_snapshot(&snapshot)?;
    Ok(snapshot)
}
