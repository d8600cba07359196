//! PNG encoding WASM bindings.
//!
//! # Functions
//!
//! - [`pack_png`] - Encode pixel data to a complete PNG file
//! - [`pack_png_chunks`] - Encode pixel data, handing each chunk to a callback
//!
//! # Example
//!
//! ```typescript
//! import { pack_png, pack_png_chunks } from '@pngpack/wasm';
//!
//! // Whole file at once
//! const png = pack_png(rgba, width, height, undefined, undefined);
//!
//! // Chunk by chunk, e.g. into a WritableStream
//! pack_png_chunks(rgba, width, height, { colorType: 6 }, 2.2, (chunk) => writer.write(chunk));
//! ```

use crate::types::{options_from_js, to_js_error, JsPacker};
use js_sys::{Function, Uint8Array};
use wasm_bindgen::prelude::*;

/// Encode pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - Row-major samples as a `Uint8Array` (4 bytes per pixel for the
///   default RGBA, 3 for `colorType: 2`, doubled for `bitDepth: 16`)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `options` - Options object, or `undefined` for defaults
/// * `gamma` - Optional gamma written as a gAMA chunk
///
/// # Errors
///
/// Returns an error if:
/// - An option is out of range
/// - Width or height is zero
/// - The pixel data length doesn't match the dimensions
/// - Compression fails
#[wasm_bindgen]
pub fn pack_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: JsValue,
    gamma: Option<f64>,
) -> Result<Vec<u8>, JsValue> {
    let packer = JsPacker::new(options)?;
    packer.pack(pixels, width, height, gamma)
}

/// Encode pixel data, calling `on_chunk` with each framed chunk in order.
///
/// The first call receives the 8-byte signature and the last the IEND chunk.
/// If encoding fails partway, the error is thrown after the chunks already
/// delivered and IEND is never delivered. An exception thrown by `on_chunk`
/// stops the encode and is rethrown.
#[wasm_bindgen]
pub fn pack_png_chunks(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: JsValue,
    gamma: Option<f64>,
    on_chunk: &Function,
) -> Result<(), JsValue> {
    let packer = JsPacker::from_options(options_from_js(options)?).map_err(to_js_error)?;
    let stream = packer
        .packer()
        .pack(pixels, width, height, gamma)
        .map_err(to_js_error)?;

    for chunk in stream {
        let chunk = chunk.map_err(to_js_error)?;
        let array = Uint8Array::from(chunk.as_slice());
        on_chunk.call1(&JsValue::NULL, &array)?;
    }
    Ok(())
}
