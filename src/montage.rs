//! Montage model: how recorded channels relate to electrodes, and the linear
//! projection between two montages.
//!
//! ```text
//! source \ target   Monopolar(ref')                 Bipolar(double banana)
//! ───────────────   ──────────────────────────────  ───────────────────────
//! Monopolar(ref)    x[e]            (ref' == ref)   x[anode] − x[cathode]
//!                   x[e] − x[ref']  (electrode)
//!                   x[e] − mean(x)  (average)
//! Bipolar           unsupported                     passthrough
//! ```
//!
//! Monopolar values are potentials relative to the recording reference, so the
//! reference electrode's own channel is identically zero. When that channel is
//! not stored in the file it is treated as an implicit zero row.
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;

use crate::electrodes::{find_electrode, find_pair, pair_of_label, Electrode, Pair, DOUBLE_BANANA};
use crate::error::{Result, StandardizeError};

/// Reference of a monopolar montage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Whatever the amplifier used (`-REF`, `-LE`, unlabeled). Cannot be a
    /// re-referencing target other than itself.
    Recorded,
    /// A single scalp electrode.
    Electrode(Electrode),
    /// Common average of the selected electrodes.
    Average,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Recorded => f.write_str("Ref"),
            Reference::Electrode(e) => write!(f, "{e}"),
            Reference::Average => f.write_str("Avg"),
        }
    }
}

impl FromStr for Reference {
    type Err = StandardizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avg" | "average" | "car" => Ok(Reference::Average),
            "ref" | "recorded" => Ok(Reference::Recorded),
            _ => s.parse::<Electrode>().map(Reference::Electrode),
        }
    }
}

/// Literal accepted on the command line for the double-banana target.
pub const DOUBLE_BANANA_TARGET: &str = "bipolar-dBanana";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Montage {
    Monopolar { reference: Reference },
    Bipolar { pairing: Vec<Pair> },
}

impl Montage {
    pub fn monopolar(reference: Reference) -> Self {
        Montage::Monopolar { reference }
    }

    /// The 18-pair longitudinal bipolar montage in canonical order.
    pub fn double_banana() -> Self {
        Montage::Bipolar { pairing: DOUBLE_BANANA.to_vec() }
    }

    /// Bipolar montage made of every channel label that names a pair.
    pub fn bipolar_from_labels(labels: &[String]) -> Self {
        Montage::Bipolar {
            pairing: labels.iter().filter_map(|l| pair_of_label(l)).collect(),
        }
    }

    pub fn kind(&self) -> MontageKind {
        match self {
            Montage::Monopolar { .. } => MontageKind::Mono,
            Montage::Bipolar { .. } => MontageKind::Bipolar,
        }
    }

    fn is_double_banana(&self) -> bool {
        matches!(self, Montage::Bipolar { pairing } if pairing.as_slice() == DOUBLE_BANANA)
    }

    /// Output channels used when the request does not name any: the 19 10-20
    /// electrodes, or every pair of a bipolar montage.
    pub fn default_channels(&self) -> Vec<Channel> {
        match self {
            Montage::Monopolar { .. } => crate::electrodes::ELECTRODES_10_20
                .iter()
                .map(|&e| Channel::Electrode(e))
                .collect(),
            Montage::Bipolar { pairing } => pairing.iter().map(|&p| Channel::Pair(p)).collect(),
        }
    }

    /// Parse requested channel names for this (target) montage.
    pub fn parse_channels<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Channel>> {
        names
            .iter()
            .map(|n| match self {
                Montage::Monopolar { .. } => n.as_ref().parse().map(Channel::Electrode),
                Montage::Bipolar { .. } => n.as_ref().parse().map(Channel::Pair),
            })
            .collect()
    }

    /// Standardized label of `channel` in this montage (`Fp1-Cz`, `Fp1-Avg`, `Fp1-F3`).
    pub fn label(&self, channel: Channel) -> String {
        match (self, channel) {
            (Montage::Monopolar { reference }, Channel::Electrode(e)) => format!("{e}-{reference}"),
            (_, Channel::Pair(p)) => p.to_string(),
            (Montage::Bipolar { .. }, Channel::Electrode(e)) => e.to_string(),
        }
    }
}

impl fmt::Display for Montage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Montage::Monopolar { reference } => write!(f, "monopolar ({reference})"),
            Montage::Bipolar { .. } if self.is_double_banana() => f.write_str(DOUBLE_BANANA_TARGET),
            Montage::Bipolar { pairing } => write!(f, "bipolar ({} pairs)", pairing.len()),
        }
    }
}

impl FromStr for Montage {
    type Err = StandardizeError;

    /// Target montage from the `ref` option: an electrode name, `Avg`, or
    /// `bipolar-dBanana`.
    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        if t.eq_ignore_ascii_case(DOUBLE_BANANA_TARGET) || t.eq_ignore_ascii_case("bipolar") {
            return Ok(Montage::double_banana());
        }
        t.parse::<Reference>().map(Montage::monopolar)
    }
}

/// Input-montage assumption (`mono` | `bipolar`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MontageKind {
    #[default]
    Mono,
    Bipolar,
}

impl FromStr for MontageKind {
    type Err = StandardizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mono" | "monopolar" | "unipolar" => Ok(MontageKind::Mono),
            "bipolar" => Ok(MontageKind::Bipolar),
            other => Err(StandardizeError::UnsupportedConversion(format!(
                "unknown input montage '{other}' (expected mono or bipolar)"
            ))),
        }
    }
}

impl fmt::Display for MontageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MontageKind::Mono => "mono",
            MontageKind::Bipolar => "bipolar",
        })
    }
}

/// One requested output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Electrode(Electrode),
    Pair(Pair),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Electrode(e) => write!(f, "{e}"),
            Channel::Pair(p) => write!(f, "{p}"),
        }
    }
}

// ── Projection ──────────────────────────────────────────────────────────

/// One output channel as a signed combination of used source columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub label: String,
    /// `(column in Projection::sources, weight)`.
    pub terms: Vec<(usize, f32)>,
}

/// Linear map from a subset of source channels to the target channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Source row read for each column, in column order.
    pub sources: Vec<usize>,
    pub outputs: Vec<Combination>,
}

impl Projection {
    pub fn labels(&self) -> Vec<String> {
        self.outputs.iter().map(|c| c.label.clone()).collect()
    }

    /// Dense `[C_out, C_used]` matrix form.
    pub fn matrix(&self) -> Array2<f32> {
        let mut m = Array2::zeros((self.outputs.len(), self.sources.len()));
        for (r, comb) in self.outputs.iter().enumerate() {
            for &(c, w) in &comb.terms {
                m[[r, c]] += w;
            }
        }
        m
    }
}

/// Collects distinct source rows in first-use order.
#[derive(Default)]
struct Columns(Vec<usize>);

impl Columns {
    fn col(&mut self, source_row: usize) -> usize {
        match self.0.iter().position(|&r| r == source_row) {
            Some(c) => c,
            None => {
                self.0.push(source_row);
                self.0.len() - 1
            }
        }
    }
}

/// Row of electrode `e` in a monopolar source, `None` when `e` is the
/// recording reference and therefore an implicit zero channel.
fn electrode_row(labels: &[String], e: Electrode, source_ref: Reference) -> Result<Option<usize>> {
    match find_electrode(labels, e) {
        Some(i) => Ok(Some(i)),
        None if source_ref == Reference::Electrode(e) => Ok(None),
        None => Err(StandardizeError::MissingElectrode(e.to_string())),
    }
}

fn push_term(terms: &mut Vec<(usize, f32)>, cols: &mut Columns, row: Option<usize>, w: f32) {
    if let Some(r) = row {
        terms.push((cols.col(r), w));
    }
}

/// Build the projection from `source` (described by `labels`) to `channels`
/// of `target`.
pub fn projection(
    source: &Montage,
    labels: &[String],
    target: &Montage,
    channels: &[Channel],
) -> Result<Projection> {
    let mut cols = Columns::default();
    let mut outputs = Vec::with_capacity(channels.len());

    match (source, target) {
        (Montage::Monopolar { reference: src_ref }, Montage::Monopolar { reference: dst_ref }) => {
            let electrodes = monopolar_channels(channels)?;
            let rows = electrodes
                .iter()
                .map(|&e| electrode_row(labels, e, *src_ref))
                .collect::<Result<Vec<_>>>()?;

            // Terms subtracted from every output channel.
            let n = electrodes.len() as f32;
            let reference_terms: Vec<(Option<usize>, f32)> = match *dst_ref {
                _ if dst_ref == src_ref => Vec::new(),
                Reference::Electrode(r) => match find_electrode(labels, r) {
                    Some(i) => vec![(Some(i), -1.0)],
                    None if *src_ref == Reference::Electrode(r) => Vec::new(),
                    None => return Err(StandardizeError::UnsupportedReference(r.to_string())),
                },
                Reference::Average => rows.iter().map(|&k| (k, -1.0 / n)).collect(),
                Reference::Recorded => {
                    return Err(StandardizeError::UnsupportedReference(format!(
                        "cannot restore the recorded reference from {src_ref}"
                    )))
                }
            };

            for (&e, &row) in electrodes.iter().zip(&rows) {
                let mut terms = Vec::with_capacity(1 + reference_terms.len());
                push_term(&mut terms, &mut cols, row, 1.0);
                for &(k, w) in &reference_terms {
                    push_term(&mut terms, &mut cols, k, w);
                }
                outputs.push(Combination { label: target.label(Channel::Electrode(e)), terms });
            }
        }

        (Montage::Monopolar { reference: src_ref }, Montage::Bipolar { pairing }) => {
            require_double_banana(target)?;
            for pair in bipolar_channels(channels, pairing)? {
                let anode = electrode_row(labels, pair.anode, *src_ref)?;
                let cathode = electrode_row(labels, pair.cathode, *src_ref)?;
                let mut terms = Vec::with_capacity(2);
                push_term(&mut terms, &mut cols, anode, 1.0);
                push_term(&mut terms, &mut cols, cathode, -1.0);
                outputs.push(Combination { label: pair.to_string(), terms });
            }
        }

        (Montage::Bipolar { .. }, Montage::Bipolar { pairing }) => {
            require_double_banana(target)?;
            for pair in bipolar_channels(channels, pairing)? {
                let row = find_pair(labels, pair)
                    .ok_or_else(|| StandardizeError::MissingElectrode(pair.to_string()))?;
                let terms = vec![(cols.col(row), 1.0)];
                outputs.push(Combination { label: pair.to_string(), terms });
            }
        }

        (Montage::Bipolar { .. }, Montage::Monopolar { .. }) => {
            return Err(StandardizeError::UnsupportedConversion(
                "a bipolar recording does not determine its monopolar potentials".into(),
            ))
        }
    }

    Ok(Projection { sources: cols.0, outputs })
}

fn require_double_banana(target: &Montage) -> Result<()> {
    if target.is_double_banana() {
        Ok(())
    } else {
        Err(StandardizeError::UnsupportedConversion(format!(
            "bipolar targets other than {DOUBLE_BANANA_TARGET} are not supported ({target})"
        )))
    }
}

fn monopolar_channels(channels: &[Channel]) -> Result<Vec<Electrode>> {
    channels
        .iter()
        .map(|c| match *c {
            Channel::Electrode(e) => Ok(e),
            Channel::Pair(p) => Err(StandardizeError::UnsupportedConversion(format!(
                "bipolar channel {p} requested for a monopolar target"
            ))),
        })
        .collect()
}

fn bipolar_channels(channels: &[Channel], pairing: &[Pair]) -> Result<Vec<Pair>> {
    channels
        .iter()
        .map(|c| match *c {
            Channel::Pair(p) if pairing.contains(&p) => Ok(p),
            other => Err(StandardizeError::MissingElectrode(other.to_string())),
        })
        .collect()
}
