//! `.npy` output for the trainer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use npyz::{DType, TypeStr, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::{Error, GeneratedDataset, Result, SwapPolicy, Tensor};

pub const X_FILE: &str = "x.npy";
pub const Y_FILE: &str = "y.npy";
pub const METADATA_FILE: &str = "metadata.json";

/// Sidecar describing how a dataset directory was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub samples: usize,
    pub source_pairs: usize,
    pub factor: usize,
    pub seed: u64,
    pub policy: SwapPolicy,
    pub x_shape: [usize; 4],
    pub y_shape: [usize; 4],
}

impl DatasetMetadata {
    pub fn from_dataset(dataset: &GeneratedDataset) -> Self {
        Self {
            samples: dataset.batch.len(),
            source_pairs: dataset.source_pairs,
            factor: dataset.factor,
            seed: dataset.seed,
            policy: dataset.policy,
            x_shape: dataset.batch.x.shape(),
            y_shape: dataset.batch.y.shape(),
        }
    }
}

/// Write `x.npy`, `y.npy` and `metadata.json` into `out_dir`.
///
/// All three files are staged as `.tmp` siblings first and only renamed into
/// place once every one of them has been written, so a failed run leaves any
/// previous dataset untouched.
pub fn write_dataset(
    out_dir: &Path,
    dataset: &GeneratedDataset,
    overwrite: bool,
) -> Result<DatasetMetadata> {
    fs::create_dir_all(out_dir)?;

    let x_path = out_dir.join(X_FILE);
    let y_path = out_dir.join(Y_FILE);
    let meta_path = out_dir.join(METADATA_FILE);
    let targets = [&x_path, &y_path, &meta_path];
    if !overwrite {
        if let Some(existing) = targets.iter().find(|path| path.exists()) {
            return Err(Error::OutputExists(existing.to_path_buf()));
        }
    }

    let metadata = DatasetMetadata::from_dataset(dataset);
    let staged = targets.map(|path| tmp_path(path));
    let written = write_npy(&dataset.batch.x, &staged[0])
        .and_then(|()| write_npy(&dataset.batch.y, &staged[1]))
        .and_then(|()| write_metadata(&metadata, &staged[2]));
    if let Err(err) = written {
        for tmp in &staged {
            let _ = fs::remove_file(tmp);
        }
        return Err(err);
    }

    for (tmp, path) in staged.iter().zip(targets) {
        fs::rename(tmp, path)?;
    }

    info!(
        "Wrote {} samples to {}",
        metadata.samples,
        out_dir.display()
    );
    Ok(metadata)
}

/// Write a tensor as little-endian `f32` with its 4-D shape, via a temp file
pub fn write_tensor_npy(tensor: &Tensor, path: &Path) -> Result<()> {
    let tmp = tmp_path(path);
    if let Err(err) = write_npy(tensor, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_npy(tensor: &Tensor, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let f4_le: TypeStr = "<f4"
        .parse()
        .map_err(|_| Error::InvalidInput("bad npy type string".to_string()))?;
    let shape: Vec<u64> = tensor.shape().iter().map(|&d| d as u64).collect();
    let mut writer = npyz::WriteOptions::new()
        .dtype(DType::Plain(f4_le))
        .shape(&shape)
        .writer(file)
        .begin_nd()?;
    writer.extend(tensor.as_slice().iter().copied())?;
    writer.finish()?;
    Ok(())
}

fn write_metadata(metadata: &DatasetMetadata, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(metadata)?.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
