//! Driver options for the generic CBOR reader/writer.
//!
//! A single [`CodecOptions`] value flows through both [`crate::value::CborValue`]
//! decoding and encoding as the minicbor context (`C`), so the same knobs a
//! caller used to produce bytes can be handed back to interpret them.

/// Selects between RFC 8949 canonical output and individually controlled flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Minimal-length integers, sorted map keys, no indefinite forms.
    Canonical,
    /// Every flag on [`CodecOptions`] is honoured as set.
    Custom,
}

/// Driver for [`crate::value::CborValue`] decode/encode.
///
/// `mode = Canonical` forces minimal-length integer/length encoding, sorted
/// map keys (by encoded-key length, then lexicographically to satisfy strict
/// RFC 8949 §4.2.1), the smallest float width that round-trips, and forbids
/// indefinite forms, regardless of the individual flags below. `mode =
/// Custom` honours the flags as set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    pub mode: Mode,
    /// Write arrays as indefinite-length.
    pub use_indefinite_arrays: bool,
    /// Write maps as indefinite-length.
    pub use_indefinite_maps: bool,
    /// Override the indefinite flags above when the collection is empty.
    pub use_definite_for_empty: bool,
    /// Sort encoded map pairs by encoded-key byte length (not lexicographic).
    pub sort_map_keys: bool,
    /// Use the shortest length header that fits the value.
    pub use_minimal_encoding: bool,
    /// Decode maps into a string-keyed record instead of an ordered-pair list.
    ///
    /// Lossy when keys are not strings: non-string keys are stringified.
    /// Callers who need fidelity must not enable this option.
    pub maps_as_objects: bool,
}

impl CodecOptions {
    /// `{mode: custom, useIndefiniteArrays: false, useIndefiniteMaps: false,
    /// useDefiniteForEmpty: true, sortMapKeys: false, useMinimalEncoding:
    /// true, mapsAsObjects: false}` — the default in Cardano use (CML).
    pub const fn cml() -> Self {
        CodecOptions {
            mode: Mode::Custom,
            use_indefinite_arrays: false,
            use_indefinite_maps: false,
            use_definite_for_empty: true,
            sort_map_keys: false,
            use_minimal_encoding: true,
            maps_as_objects: false,
        }
    }

    /// CML's Plutus-data profile: same as [`Self::cml`] but with indefinite
    /// arrays and maps turned on, matching CML's compact field-list encoding.
    pub const fn plutus_data() -> Self {
        CodecOptions {
            use_indefinite_arrays: true,
            use_indefinite_maps: true,
            ..Self::cml()
        }
    }

    /// Decode convenience profile that returns string-keyed records for maps.
    pub const fn struct_friendly() -> Self {
        CodecOptions {
            maps_as_objects: true,
            ..Self::cml()
        }
    }

    /// Strict RFC 8949 §4.2.1 canonical encoding.
    pub const fn canonical() -> Self {
        CodecOptions {
            mode: Mode::Canonical,
            ..Self::cml()
        }
    }

    pub(crate) fn indefinite_arrays(&self) -> bool {
        matches!(self.mode, Mode::Custom) && self.use_indefinite_arrays
    }

    pub(crate) fn indefinite_maps(&self) -> bool {
        matches!(self.mode, Mode::Custom) && self.use_indefinite_maps
    }

    pub(crate) fn definite_for_empty(&self) -> bool {
        matches!(self.mode, Mode::Canonical) || self.use_definite_for_empty
    }

    pub(crate) fn minimal_encoding(&self) -> bool {
        matches!(self.mode, Mode::Canonical) || self.use_minimal_encoding
    }

    pub(crate) fn sorts_map_keys(&self) -> bool {
        matches!(self.mode, Mode::Canonical) || self.sort_map_keys
    }

    pub(crate) fn canonical_tie_break(&self) -> bool {
        matches!(self.mode, Mode::Canonical)
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::cml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_overrides_custom_flags() {
        let opts = CodecOptions {
            use_indefinite_arrays: true,
            ..CodecOptions::canonical()
        };
        assert!(!opts.indefinite_arrays());
        assert!(opts.minimal_encoding());
        assert!(opts.sorts_map_keys());
        assert!(opts.canonical_tie_break());
    }

    #[test]
    fn plutus_data_defaults_to_indefinite() {
        let opts = CodecOptions::plutus_data();
        assert!(opts.indefinite_arrays());
        assert!(opts.indefinite_maps());
    }
}
