//! pngpack WASM - WebAssembly bindings for pngpack
//!
//! This crate provides WASM bindings to expose the pngpack-core encoder
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - Reusable `JsPacker` wrapper holding validated options
//! - `encode` - One-shot and chunk-callback PNG encoding functions
//!
//! # Usage
//!
//! ```typescript
//! import init, { pack_png } from '@pngpack/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const rgba = new Uint8Array(width * height * 4);
//! const png = pack_png(rgba, width, height, { deflateLevel: 6 }, 1 / 2.2);
//! await writable.write(new Blob([png], { type: 'image/png' }));
//! ```

use wasm_bindgen::prelude::*;

mod encode;
mod types;

// Re-export public types
pub use encode::{pack_png, pack_png_chunks};
pub use types::JsPacker;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
