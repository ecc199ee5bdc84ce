// Adapters layer: concrete implementations for external systems (http APIs, storage).

pub mod nominatim;
pub mod rainviewer;
pub mod storage;
