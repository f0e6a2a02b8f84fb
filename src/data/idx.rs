use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

const IMAGE_HEADER_LEN: usize = 16;
const LABEL_HEADER_LEN: usize = 8;
/// Upper bound on `rows * cols`; the feature matrix holds one row per pixel.
const MAX_IMAGE_PIXELS: usize = 1 << 24;

/// Images and labels decoded from an IDX pair (MNIST, Fashion-MNIST, …).
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `(rows * cols) × n_samples`, pixels scaled to `[0, 1]`. One sample per column.
    pub features: Matrix,
    pub labels: Vec<usize>,
    /// Image height in pixels.
    pub rows: usize,
    /// Image width in pixels.
    pub cols: usize,
}

impl Dataset {
    /// Reads and decodes an IDX3 image file and an IDX1 label file.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(image_path: P, label_path: Q) -> Result<Dataset> {
        let image_bytes = std::fs::read(image_path)?;
        let label_bytes = std::fs::read(label_path)?;
        parse_idx_pair(&image_bytes, &label_bytes)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// One more than the largest label present; 0 for an empty dataset.
    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |&max| max + 1)
    }

    /// The first `n` samples (or all of them if there are fewer).
    pub fn take(&self, n: usize) -> Dataset {
        let n = n.min(self.len());
        let data = self.features.data.iter()
            .map(|row| row[..n].to_vec())
            .collect();
        Dataset {
            features: Matrix { rows: self.features.rows, cols: n, data },
            labels: self.labels[..n].to_vec(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

fn read_u32_be(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3],
    ]) as usize
}

fn check_header(bytes: &[u8], what: &str, header_len: usize, dims: u8) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::Dataset(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}.",
            what, header_len, bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 3 (dimensions) must be {}, got {}.",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

/// Decodes a pair of IDX buffers into a [`Dataset`].
///
/// # IDX3 image file layout
/// ```text
/// bytes  0-1:   0x00 0x00   (reserved, must be zero)
/// byte   2:     0x08        (dtype = uint8)
/// byte   3:     0x03        (number of dimensions = 3)
/// bytes  4-7:   N           (number of images, big-endian u32)
/// bytes  8-11:  rows        (image height in pixels, big-endian u32)
/// bytes 12-15:  cols        (image width in pixels, big-endian u32)
/// bytes 16..:   N * rows * cols bytes, row-major, uint8
/// ```
///
/// # IDX1 label file layout
/// ```text
/// bytes  0-3:   0x00 0x00 0x08 0x01
/// bytes  4-7:   N           (number of labels, big-endian u32)
/// bytes  8..:   N bytes, each a class index
/// ```
pub fn parse_idx_pair(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Dataset> {
    check_header(image_bytes, "image", IMAGE_HEADER_LEN, 0x03)?;
    check_header(label_bytes, "label", LABEL_HEADER_LEN, 0x01)?;

    let n_items = read_u32_be(image_bytes, 4);
    let rows = read_u32_be(image_bytes, 8);
    let cols = read_u32_be(image_bytes, 12);
    let label_count = read_u32_be(label_bytes, 4);

    if label_count != n_items {
        return Err(Error::Dataset(format!(
            "IDX file mismatch: image file declares {} items but label file declares {}.",
            n_items, label_count
        )));
    }

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        Error::Dataset(format!("IDX image file: rows * cols overflows (rows={}, cols={}).", rows, cols))
    })?;
    if n_pixels > MAX_IMAGE_PIXELS {
        return Err(Error::Dataset(format!(
            "IDX image file: {}×{} images are too large (limit is {} pixels).",
            rows, cols, MAX_IMAGE_PIXELS
        )));
    }
    let image_len = n_items.checked_mul(n_pixels)
        .and_then(|len| len.checked_add(IMAGE_HEADER_LEN))
        .ok_or_else(|| Error::Dataset("IDX image file: data length overflows.".to_owned()))?;

    if image_bytes.len() < image_len {
        return Err(Error::Dataset(format!(
            "IDX image file too short: header declares {} items of {}×{} pixels, \
             but file is only {} bytes total.",
            n_items, rows, cols, image_bytes.len()
        )));
    }
    if label_bytes.len() < LABEL_HEADER_LEN + n_items {
        return Err(Error::Dataset(format!(
            "IDX label file too short: header declares {} labels but file is only {} bytes.",
            n_items, label_bytes.len()
        )));
    }

    // Each image becomes one column.
    let mut features = Matrix::zeros(n_pixels, n_items);
    if n_pixels > 0 {
        let pixels = &image_bytes[IMAGE_HEADER_LEN..image_len];
        for (sample, chunk) in pixels.chunks_exact(n_pixels).enumerate() {
            for (p, &px) in chunk.iter().enumerate() {
                features.data[p][sample] = px as f64 / 255.0;
            }
        }
    }

    let labels = label_bytes[LABEL_HEADER_LEN..LABEL_HEADER_LEN + n_items]
        .iter()
        .map(|&y| y as usize)
        .collect();

    debug!("decoded {} IDX samples of {}×{}", n_items, rows, cols);
    Ok(Dataset { features, labels, rows, cols })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_file(n: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        for v in [n, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(pixels);
        bytes
    }

    fn label_file(labels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn decodes_samples_as_columns() {
        let images = image_file(2, 1, 2, &[0, 255, 51, 102]);
        let ds = parse_idx_pair(&images, &label_file(&[3, 1])).unwrap();
        assert_eq!(ds.features.shape(), (2, 2));
        assert_eq!(ds.features.column_values(0), vec![0.0, 1.0]);
        assert_eq!(ds.features.column_values(1), vec![0.2, 0.4]);
        assert_eq!(ds.labels, vec![3, 1]);
        assert_eq!(ds.num_classes(), 4);

        let first = ds.take(1);
        assert_eq!(first.features.shape(), (2, 1));
        assert_eq!(first.labels, vec![3]);
    }

    #[test]
    fn rejects_wrong_dimension_byte() {
        let mut images = image_file(1, 1, 1, &[0]);
        images[3] = 0x02;
        assert!(matches!(parse_idx_pair(&images, &label_file(&[0])), Err(Error::Dataset(_))));
    }

    #[test]
    fn rejects_count_mismatch() {
        let images = image_file(2, 1, 1, &[0, 0]);
        assert!(matches!(parse_idx_pair(&images, &label_file(&[0])), Err(Error::Dataset(_))));
    }

    #[test]
    fn rejects_truncated_pixels() {
        let images = image_file(2, 2, 2, &[0; 5]);
        assert!(matches!(parse_idx_pair(&images, &label_file(&[0, 1])), Err(Error::Dataset(_))));
    }

    #[test]
    fn rejects_oversized_images_in_empty_file() {
        let images = image_file(0, u32::MAX, u32::MAX, &[]);
        assert!(matches!(parse_idx_pair(&images, &label_file(&[])), Err(Error::Dataset(_))));

        let images = image_file(0, 8192, 8192, &[]);
        assert!(matches!(parse_idx_pair(&images, &label_file(&[])), Err(Error::Dataset(_))));
    }

    #[test]
    fn empty_file_decodes_to_empty_dataset() {
        let ds = parse_idx_pair(&image_file(0, 28, 28, &[]), &label_file(&[])).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.features.shape(), (784, 0));
        assert_eq!(ds.num_classes(), 0);
    }

    #[test]
    fn rejects_short_header() {
        assert!(matches!(parse_idx_pair(&[0, 0, 8], &label_file(&[])), Err(Error::Dataset(_))));
    }
}
