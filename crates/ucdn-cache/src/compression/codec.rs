//! Byte-level encoders for variant builds

use super::Encoding;
use crate::{CacheError, CacheResult};

/// Encodes `data` with the given encoding.
///
/// Identity returns a copy of the input. Brotli uses quality 11, gzip and
/// deflate use the best flate2 level.
///
/// # Errors
///
/// Returns [`CacheError::Compression`] if the encoder fails, or when the crate
/// was built without the `compression` feature and a compressed encoding is
/// requested.
///
/// # Examples
///
/// ```
/// use ucdn_cache::{Encoding, compression::compress};
///
/// let data = b"body { color: red; }".repeat(50);
/// let gz = compress(Encoding::Gzip, &data).unwrap();
/// assert!(gz.len() < data.len());
/// assert_eq!(compress(Encoding::Identity, &data).unwrap(), data);
/// ```
pub fn compress(encoding: Encoding, data: &[u8]) -> CacheResult<Vec<u8>> {
	match encoding {
		Encoding::Identity => Ok(data.to_vec()),
		#[cfg(feature = "compression")]
		Encoding::Gzip => {
			use flate2::Compression;
			use flate2::write::GzEncoder;
			use std::io::Write;

			let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
			encoder
				.write_all(data)
				.map_err(|e| CacheError::Compression(e.to_string()))?;
			encoder
				.finish()
				.map_err(|e| CacheError::Compression(e.to_string()))
		}
		#[cfg(feature = "compression")]
		Encoding::Deflate => {
			use flate2::Compression;
			use flate2::write::ZlibEncoder;
			use std::io::Write;

			// HTTP "deflate" is the zlib container, not raw deflate
			let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
			encoder
				.write_all(data)
				.map_err(|e| CacheError::Compression(e.to_string()))?;
			encoder
				.finish()
				.map_err(|e| CacheError::Compression(e.to_string()))
		}
		#[cfg(feature = "compression")]
		Encoding::Brotli => {
			let mut output = Vec::new();
			let mut reader = std::io::Cursor::new(data);
			brotli::BrotliCompress(
				&mut reader,
				&mut output,
				&brotli::enc::BrotliEncoderParams {
					quality: 11,
					..Default::default()
				},
			)
			.map_err(|e| CacheError::Compression(e.to_string()))?;
			Ok(output)
		}
		#[cfg(not(feature = "compression"))]
		other => Err(CacheError::Compression(format!(
			"{:?} requested but compression support is disabled",
			other
		))),
	}
}

#[cfg(all(test, feature = "compression"))]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Read;

	fn sample() -> Vec<u8> {
		"console.log('test');".repeat(100).into_bytes()
	}

	#[rstest]
	fn test_gzip_output_is_gzip() {
		let data = sample();
		let compressed = compress(Encoding::Gzip, &data).unwrap();
		assert_eq!(&compressed[..2], &[0x1f, 0x8b]);

		let mut decoded = Vec::new();
		flate2::read::GzDecoder::new(&compressed[..])
			.read_to_end(&mut decoded)
			.unwrap();
		assert_eq!(decoded, data);
	}

	#[rstest]
	fn test_deflate_uses_zlib_container() {
		let data = sample();
		let compressed = compress(Encoding::Deflate, &data).unwrap();

		let mut decoded = Vec::new();
		flate2::read::ZlibDecoder::new(&compressed[..])
			.read_to_end(&mut decoded)
			.unwrap();
		assert_eq!(decoded, data);
	}

	#[rstest]
	fn test_brotli_shrinks_repetitive_input() {
		let data = sample();
		let compressed = compress(Encoding::Brotli, &data).unwrap();
		assert!(compressed.len() < data.len() / 4);

		let mut decoded = Vec::new();
		brotli::Decompressor::new(&compressed[..], 4096)
			.read_to_end(&mut decoded)
			.unwrap();
		assert_eq!(decoded, data);
	}
}
