use flate2::{write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tar::{Archive, Builder, EntryType, Header};

pub const CONFIG_FILE: &str = "config.json";
pub const COMPARISON_FILE: &str = "comparison.json";
pub const FINAL_POPULATIONS_FILE: &str = "final_populations.json";
pub const MEAN_TRAJECTORY_FILE: &str = "mean_trajectory.json";
pub const MARGINAL_FILE: &str = "marginal.json";
pub const NETWORK_FILE: &str = "network.json";
pub const COMPLETION_TIMES_FILE: &str = "completion_times.json";

/// Creates a gzip compressed tar archive at `path`, along with any missing
/// parent directories.
pub fn create_archive(
    path: impl AsRef<Path>,
) -> Result<Builder<GzEncoder<fs::File>>, Box<dyn std::error::Error + 'static>> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let outfile = fs::File::create(path)?;
    let zipper = GzEncoder::new(outfile, Compression::default());
    Ok(Builder::new(zipper))
}

/// Appends `data` as a JSON file at `path` inside the archive. Paths longer
/// than a plain tar header holds are written with a GNU long name entry.
pub fn serialize_object<W: Write>(
    path: impl AsRef<Path>,
    data: &impl Serialize,
    archive: &mut Builder<W>,
) -> Result<(), Box<dyn std::error::Error + 'static>> {
    let contents = serde_json::to_vec(data)?;
    archive.append_data(&mut json_header(contents.len()), path, contents.as_slice())?;
    Ok(())
}

fn json_header(size: usize) -> Header {
    let mut header = Header::new_gnu();
    header.set_size(size as u64);
    header.set_mode(0o644);
    header.set_entry_type(EntryType::Regular);
    header
}

/// Reads the JSON file at `path` back out of an archive.
pub fn deserialize_object<T: DeserializeOwned, R: Read>(
    path: &str,
    archive: &mut Archive<R>,
) -> Result<T, Box<dyn std::error::Error + 'static>> {
    for entry in archive.entries()? {
        let entry = entry?;
        if entry.path()? == Path::new(path) {
            return Ok(serde_json::from_reader(entry)?);
        }
    }
    Err(format!("{} not found in archive", path).into())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::analysis::Summary;
    use flate2::read::GzDecoder;

    fn archive_bytes(contents: &[(String, Vec<f64>)]) -> Vec<u8> {
        let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, data) in contents {
            serialize_object(path, data, &mut builder).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn objects_survive_the_archive() {
        let summary = Summary::new(&[1., 2., 4.]).unwrap();
        let trajectory = vec![(0., 0.), (0.5, 1.25)];

        let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        serialize_object(format!("a/{}", COMPARISON_FILE), &summary, &mut builder).unwrap();
        serialize_object(
            Path::new("a").join(MEAN_TRAJECTORY_FILE),
            &trajectory,
            &mut builder,
        )
        .unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let open = || Archive::new(GzDecoder::new(&bytes[..]));
        let back: Summary = deserialize_object("a/comparison.json", &mut open()).unwrap();
        assert_eq!(back, summary);
        let back: Vec<(f64, f64)> =
            deserialize_object("a/mean_trajectory.json", &mut open()).unwrap();
        assert_eq!(back, trajectory);
        assert!(deserialize_object::<Summary, _>("b/comparison.json", &mut open()).is_err());
    }

    #[test]
    fn entries_are_regular_readable_files() {
        let bytes = archive_bytes(&[("x/marginal.json".to_string(), vec![0.25, 0.75])]);
        let mut archive = Archive::new(GzDecoder::new(&bytes[..]));
        let entries: Vec<_> = archive.entries().unwrap().map(|e| e.unwrap()).collect();
        assert_eq!(entries.len(), 1);
        let header = entries[0].header();
        assert_eq!(header.entry_type(), EntryType::Regular);
        assert_eq!(header.mode().unwrap(), 0o644);
        assert_eq!(header.size().unwrap(), "[0.25,0.75]".len() as u64);
    }

    #[test]
    fn long_paths_are_kept_whole() {
        let path = format!("{}/{}", "GoldbeterKoshlandTqssa".repeat(8), MARGINAL_FILE);
        assert!(path.len() > 100);
        let bytes = archive_bytes(&[(path.clone(), vec![1.])]);
        let back: Vec<f64> =
            deserialize_object(&path, &mut Archive::new(GzDecoder::new(&bytes[..]))).unwrap();
        assert_eq!(back, vec![1.]);
    }
}
