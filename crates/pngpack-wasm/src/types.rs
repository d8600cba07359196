//! WASM-compatible wrapper types.
//!
//! Options cross the boundary as plain JavaScript objects using the same
//! camelCase names as `PackerOptions` (`deflateChunkSize`, `deflateLevel`,
//! `deflateStrategy`, `bitDepth`, `colorType`, `filterType`, `gamma`).

use pngpack_core::{PackError, Packer, PackerOptions};
use wasm_bindgen::prelude::*;

/// A reusable packer for JavaScript.
///
/// Options are validated once in the constructor; every `pack` call reuses them.
#[wasm_bindgen]
pub struct JsPacker {
    inner: Packer,
}

#[wasm_bindgen]
impl JsPacker {
    /// Create a packer from an options object (or `undefined` for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsPacker, JsValue> {
        let options = options_from_js(options)?;
        JsPacker::from_options(options).map_err(to_js_error)
    }

    /// Encode pixels into a complete PNG file.
    pub fn pack(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<Vec<u8>, JsValue> {
        self.pack_bytes(pixels, width, height, gamma)
            .map_err(to_js_error)
    }

    /// Bytes per pixel the packer expects in its input.
    #[wasm_bindgen(getter)]
    pub fn bytes_per_pixel(&self) -> usize {
        self.inner.options().bytes_per_pixel()
    }
}

impl JsPacker {
    pub(crate) fn from_options(options: PackerOptions) -> Result<Self, PackError> {
        Ok(Self {
            inner: Packer::new(options)?,
        })
    }

    pub(crate) fn pack_bytes(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<Vec<u8>, PackError> {
        self.inner.pack_to_vec(pixels, width, height, gamma)
    }

    pub(crate) fn packer(&self) -> &Packer {
        &self.inner
    }
}

/// Read `PackerOptions` from a JS value, treating `undefined`/`null` as defaults.
pub(crate) fn options_from_js(value: JsValue) -> Result<PackerOptions, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(PackerOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

pub(crate) fn to_js_error(err: PackError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
