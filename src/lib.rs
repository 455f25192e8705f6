//! LazyOcrEdit – editor textu rozpoznaného OCR, vykreslený přes pevné plátno.
//!
//! Jádro tvoří přepočet geometrie regionů (`mapper`), automat editace (`edit`),
//! hledání (`search`) a skládání jednoho průchodu vykreslování (`overlay`).
//! Vše ostatní (extrakce, export, přihlášení) jsou okrajové služby.

pub mod blake3;
pub mod canvas;
pub mod edit;
pub mod error;
pub mod export;
pub mod extraction;
pub mod logging;
pub mod manifest;
pub mod mapper;
pub mod overlay;
pub mod region;
pub mod search;
pub mod session;
pub mod tesseract;
pub mod workspace;
