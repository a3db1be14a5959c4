//! Per-format stripe and unroll tuning
//!
//! The best stripe and unroll values depend on the pixel layout, the bit
//! depth, whether a mask is applied, and the machine. They are recorded one
//! per line in a small text format:
//!
//! ```text
//! // Cortex-A72
//! TUNE(mono, 8, 0, 4, 16)
//! TUNE(abc, 12, 1, 1, 4)
//! ```
//!
//! Fields are `layout, bits, masked, stripes, unrolls`. Blank lines and
//! lines starting with `//` or `#` are ignored.
//!
//! The engine never reads tuning files itself. A caller parses a table once
//! and passes the resulting [`StripeConfig`] (or [`ScanOptions`]) with each
//! call.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::trace;

use crate::config::{ScanOptions, StripeConfig};
use crate::error::{Error, Result};
use crate::image::BitDepth;

/// How the counted samples are arranged within a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// One counted sample per pixel
    Mono,
    /// Three components, all counted
    Abc,
    /// Four components, the first three counted
    Abcx,
    /// Four components, the last three counted
    Xabc,
}

impl PixelLayout {
    /// Classify a component selection on a `components`-sample pixel.
    ///
    /// A single selected component is `Mono`. Four-sample pixels counting
    /// `[1, 2, 3]` are `Xabc`; any other selection on four samples is
    /// `Abcx`. Everything else is `Abc`.
    pub fn classify(components: usize, selection: &[usize]) -> Self {
        match (components, selection) {
            (_, [_]) => PixelLayout::Mono,
            (4, [1, 2, 3]) => PixelLayout::Xabc,
            (4, _) => PixelLayout::Abcx,
            _ => PixelLayout::Abc,
        }
    }

    /// The name used in tuning records.
    pub fn as_str(self) -> &'static str {
        match self {
            PixelLayout::Mono => "mono",
            PixelLayout::Abc => "abc",
            PixelLayout::Abcx => "abcx",
            PixelLayout::Xabc => "xabc",
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mono" => Ok(PixelLayout::Mono),
            "abc" => Ok(PixelLayout::Abc),
            "abcx" => Ok(PixelLayout::Abcx),
            "xabc" => Ok(PixelLayout::Xabc),
            _ => Err(Error::InvalidParameter(format!(
                "unknown pixel layout '{s}'"
            ))),
        }
    }
}

/// Stripe and unroll values for one `(layout, bits, masked)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningRecord {
    pub layout: PixelLayout,
    pub depth: BitDepth,
    pub masked: bool,
    pub stripes: usize,
    pub unroll: usize,
}

impl fmt::Display for TuningRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TUNE({}, {}, {}, {}, {})",
            self.layout,
            self.depth.bits(),
            u8::from(self.masked),
            self.stripes,
            self.unroll
        )
    }
}

type Key = (PixelLayout, BitDepth, bool);

const BUILTIN: &str = "\
// Broadcom BCM2711 (Cortex-A72)
TUNE(mono, 8, 0, 4, 16)
TUNE(mono, 8, 1, 4, 8)
TUNE(mono, 12, 0, 2, 16)
TUNE(mono, 12, 1, 2, 16)
TUNE(mono, 16, 0, 1, 16)
TUNE(mono, 16, 1, 2, 2)
TUNE(abc, 8, 0, 2, 4)
TUNE(abc, 8, 1, 2, 2)
TUNE(abc, 12, 0, 1, 4)
TUNE(abc, 12, 1, 1, 4)
TUNE(abc, 16, 0, 1, 1)
TUNE(abc, 16, 1, 1, 1)
TUNE(abcx, 8, 0, 2, 4)
TUNE(abcx, 8, 1, 2, 2)
TUNE(abcx, 12, 0, 1, 4)
TUNE(abcx, 12, 1, 1, 4)
TUNE(abcx, 16, 0, 1, 1)
TUNE(abcx, 16, 1, 1, 1)
";

// The built-in text is a constant known to parse.
static BUILTIN_TABLE: LazyLock<TuningTable> =
    LazyLock::new(|| TuningTable::parse(BUILTIN).unwrap_or_default());

/// A set of tuning records with built-in fallbacks.
#[derive(Debug, Clone, Default)]
pub struct TuningTable {
    entries: HashMap<Key, (usize, usize)>,
}

impl TuningTable {
    /// An empty table; every lookup uses the built-in values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        BUILTIN_TABLE.clone()
    }

    /// Parse tuning records, one per line.
    ///
    /// A later record for the same combination replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTuning`] with the 1-based line number for
    /// any line that is not a comment, blank, or a well-formed record.
    ///
    /// # Example
    ///
    /// ```
    /// use histoscan_core::{BitDepth, PixelLayout, TuningTable};
    ///
    /// let table = TuningTable::parse("TUNE(mono, 8, 0, 8, 4)\n").unwrap();
    /// let config = table.lookup(PixelLayout::Mono, BitDepth::Bit8, false);
    /// assert_eq!((config.stripes(), config.unroll()), (8, 4));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                trace!("tuning line {}: skipped", index + 1);
                continue;
            }
            let record = parse_record(line).map_err(|message| Error::InvalidTuning {
                line: index + 1,
                message,
            })?;
            table.insert(record);
        }
        Ok(table)
    }

    /// Add or replace a record.
    pub fn insert(&mut self, record: TuningRecord) {
        self.entries.insert(
            (record.layout, record.depth, record.masked),
            (record.stripes, record.unroll),
        );
    }

    /// Number of explicit records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no explicit records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The explicit records, sorted for stable output.
    pub fn records(&self) -> Vec<TuningRecord> {
        let mut records: Vec<TuningRecord> = self
            .entries
            .iter()
            .map(|(&(layout, depth, masked), &(stripes, unroll))| TuningRecord {
                layout,
                depth,
                masked,
                stripes,
                unroll,
            })
            .collect();
        records.sort_by_key(|r| (r.layout.as_str(), r.depth.bits(), r.masked));
        records
    }

    fn find(&self, layout: PixelLayout, depth: BitDepth, masked: bool) -> Option<(usize, usize)> {
        let key = |layout| (layout, depth, masked);
        self.entries.get(&key(layout)).copied().or_else(|| {
            (layout == PixelLayout::Xabc)
                .then(|| self.entries.get(&key(PixelLayout::Abcx)).copied())
                .flatten()
        })
    }

    /// Stripe and unroll values for a combination.
    ///
    /// Looks in this table, then the built-in table. `xabc` uses the
    /// `abcx` record when it has none of its own. The grain size is left
    /// unset, so it follows the image width at scan time; use
    /// [`TuningTable::scan_options`] to fix grains for a particular width.
    pub fn lookup(&self, layout: PixelLayout, depth: BitDepth, masked: bool) -> StripeConfig {
        let fallback = StripeConfig::default();
        let (stripes, unroll) = self
            .find(layout, depth, masked)
            .or_else(|| BUILTIN_TABLE.find(layout, depth, masked))
            .unwrap_or((fallback.stripes(), fallback.unroll()));
        StripeConfig::with_auto_grain(stripes, unroll).unwrap_or(fallback)
    }

    /// Full scan options for an image `width` pixels wide.
    ///
    /// Grain rows follow the default grain size for `depth`.
    pub fn scan_options(
        &self,
        layout: PixelLayout,
        depth: BitDepth,
        masked: bool,
        width: usize,
    ) -> ScanOptions {
        let grain_rows =
            StripeConfig::grain_rows_for_width(StripeConfig::default_grain_pixels(depth), width);
        let tuning = self.lookup(layout, depth, masked);
        ScanOptions::default().with_tuning(tuning.with_grain_rows(grain_rows).unwrap_or(tuning))
    }
}

fn parse_record(line: &str) -> std::result::Result<TuningRecord, String> {
    let inner = line
        .strip_prefix("TUNE(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| format!("expected TUNE(...), got '{line}'"))?;
    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [layout, bits, masked, stripes, unroll] = fields[..] else {
        return Err(format!("expected 5 fields, got {}", fields.len()));
    };

    let layout: PixelLayout = layout.parse().map_err(|e: Error| e.to_string())?;
    let bits: u32 = bits
        .parse()
        .map_err(|_| format!("bits '{bits}' is not a number"))?;
    let depth = BitDepth::from_bits(bits).map_err(|e| e.to_string())?;
    let masked = match masked {
        "0" => false,
        "1" => true,
        _ => return Err(format!("masked must be 0 or 1, got '{masked}'")),
    };
    let positive = |name: &str, value: &str| match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{name} must be a positive integer, got '{value}'")),
    };
    Ok(TuningRecord {
        layout,
        depth,
        masked,
        stripes: positive("stripes", stripes)?,
        unroll: positive("unrolls", unroll)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_values() {
        let table = TuningTable::builtin();
        assert_eq!(table.len(), 18);
        let c = table.lookup(PixelLayout::Mono, BitDepth::Bit8, false);
        assert_eq!((c.stripes(), c.unroll()), (4, 16));
        let c = table.lookup(PixelLayout::Mono, BitDepth::Bit16, true);
        assert_eq!((c.stripes(), c.unroll()), (2, 2));
        let c = table.lookup(PixelLayout::Abc, BitDepth::Bit12, false);
        assert_eq!((c.stripes(), c.unroll()), (1, 4));
    }

    #[test]
    fn test_builtin_parsed_once() {
        let first: *const TuningTable = &*BUILTIN_TABLE;
        let c = TuningTable::new().lookup(PixelLayout::Abc, BitDepth::Bit16, true);
        assert_eq!((c.stripes(), c.unroll()), (1, 1));
        assert!(std::ptr::eq(first, &*BUILTIN_TABLE));
        assert_eq!(TuningTable::builtin().records(), BUILTIN_TABLE.records());
    }

    #[test]
    fn test_xabc_uses_abcx() {
        let table = TuningTable::parse("TUNE(abcx, 8, 1, 3, 5)").unwrap();
        let c = table.lookup(PixelLayout::Xabc, BitDepth::Bit8, true);
        assert_eq!((c.stripes(), c.unroll()), (3, 5));

        let table = TuningTable::parse("TUNE(abcx, 8, 1, 3, 5)\nTUNE(xabc, 8, 1, 7, 2)").unwrap();
        let c = table.lookup(PixelLayout::Xabc, BitDepth::Bit8, true);
        assert_eq!((c.stripes(), c.unroll()), (7, 2));
    }

    #[test]
    fn test_empty_table_falls_back() {
        let c = TuningTable::new().lookup(PixelLayout::Xabc, BitDepth::Bit8, false);
        assert_eq!((c.stripes(), c.unroll()), (2, 4));
    }

    #[test]
    fn test_parse_comments_and_blanks() {
        let text = "\n# header\n  // note\nTUNE(mono, 12, 1, 2, 16)\n\n";
        let table = TuningTable::parse(text).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let cases = [
            "TUNE(mono, 8, 0, 4)",
            "TUNE(rgb, 8, 0, 4, 4)",
            "TUNE(mono, 10, 0, 4, 4)",
            "TUNE(mono, 8, 2, 4, 4)",
            "TUNE(mono, 8, 0, 0, 4)",
            "TUNE(mono, 8, 0, 4, x)",
            "mono, 8, 0, 4, 4",
        ];
        for case in cases {
            let text = format!("// ok\n{case}\n");
            match TuningTable::parse(&text) {
                Err(Error::InvalidTuning { line, .. }) => assert_eq!(line, 2, "{case}"),
                other => panic!("{case}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_record_display_round_trip() {
        let record = TuningRecord {
            layout: PixelLayout::Abcx,
            depth: BitDepth::Bit16,
            masked: true,
            stripes: 1,
            unroll: 2,
        };
        let text = record.to_string();
        assert_eq!(text, "TUNE(abcx, 16, 1, 1, 2)");
        assert_eq!(TuningTable::parse(&text).unwrap().records(), vec![record]);
    }

    #[test]
    fn test_classify_layout() {
        assert_eq!(PixelLayout::classify(1, &[0]), PixelLayout::Mono);
        assert_eq!(PixelLayout::classify(3, &[2]), PixelLayout::Mono);
        assert_eq!(PixelLayout::classify(3, &[0, 1, 2]), PixelLayout::Abc);
        assert_eq!(PixelLayout::classify(4, &[0, 1, 2]), PixelLayout::Abcx);
        assert_eq!(PixelLayout::classify(4, &[1, 2, 3]), PixelLayout::Xabc);
    }

    #[test]
    fn test_scan_options_grain_rows() {
        let table = TuningTable::builtin();
        let opts = table.scan_options(PixelLayout::Mono, BitDepth::Bit8, false, 1024);
        assert_eq!(opts.tuning.grain_rows(), Some(16));
        assert_eq!(opts.tuning.stripes(), 4);
        let opts = table.scan_options(PixelLayout::Mono, BitDepth::Bit16, false, 1024);
        assert_eq!(opts.tuning.grain_rows(), Some(128));
        let c = table.lookup(PixelLayout::Mono, BitDepth::Bit16, false);
        assert_eq!(c.grain_rows(), None);
    }
}
