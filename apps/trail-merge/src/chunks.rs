//! Reading merged chunks back for import into the path store.

use std::path::Path;

use anyhow::{Context, Result};

use tn_core::{GeoPoint, PathId};
use tn_merge::{NetworkChunk, NetworkElement};
use tn_route::{ImportStats, PathImporter, PathSequence};

/// All elements of the `{prefix}_*.json` chunks in `dir`, in element id
/// order.
pub fn read_chunks(dir: &Path, prefix: &str) -> Result<Vec<NetworkElement>> {
    let head = format!("{prefix}_");
    let files = tn_merge::loader::list_json_files(dir)
        .with_context(|| format!("listing {}", dir.display()))?;

    let mut elements = Vec::new();
    for path in files {
        let is_chunk = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&head));
        if !is_chunk {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let chunk: NetworkChunk = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        elements.extend(chunk.elements);
    }
    elements.sort_by_key(|e| e.id);
    Ok(elements)
}

/// One stored path per element, keyed by the element id.
pub fn import_elements(elements: &[NetworkElement], snap_m: f64) -> (Vec<PathSequence>, ImportStats) {
    let mut importer = PathImporter::new().with_snap_m(snap_m);
    for e in elements {
        let points: Vec<GeoPoint> = e.geometry.iter().map(|p| GeoPoint::new(p.lat, p.lon)).collect();
        importer.add_path(PathId(e.id), &points);
    }
    importer.finish()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tn_core::{Bounds, GeoPoint};
    use tn_merge::{ElevatedPoint, NetworkElement, NetworkWriter};

    use super::{import_elements, read_chunks};

    fn element(id: u64, lons: &[f64]) -> NetworkElement {
        let geometry: Vec<ElevatedPoint> =
            lons.iter().map(|&lon| ElevatedPoint { lat: 0.0, lon, alt: 0.0 }).collect();
        let bounds = Bounds::from_points(lons.iter().map(|&lon| GeoPoint::new(0.0, lon))).unwrap();
        NetworkElement { id, bounds, geometry }
    }

    #[test]
    fn chunks_round_trip_into_sequences() {
        let dir = TempDir::new().unwrap();
        let writer = NetworkWriter::new(dir.path()).with_chunk_size(1).with_prefix("net");
        writer
            .write(&[element(1, &[0.0, 0.001]), element(2, &[0.001, 0.002])])
            .unwrap();
        std::fs::write(dir.path().join("other.json"), "{}").unwrap();

        let elements = read_chunks(dir.path(), "net").unwrap();
        assert_eq!(elements.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        let (seqs, stats) = import_elements(&elements, 20.0);
        assert_eq!(seqs.len(), 2);
        assert_eq!(stats.snapped, 1);
        assert_eq!(seqs[0].nodes[1].id, seqs[1].nodes[0].id);
    }
}
