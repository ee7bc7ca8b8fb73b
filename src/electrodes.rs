//! Electrode catalog: the 19 scalp sites of the 10-20 system and the 18
//! pairs of the longitudinal bipolar ("double banana") montage.
//!
//! Source datasets name the same site differently (`T7` vs `T3`, `EEG FP1-REF`,
//! `FP1-LE`, …). [`Electrode::from_str`] accepts the aliases; the channel
//! lookup helpers strip the usual prefixes and reference suffixes.
use std::fmt;
use std::str::FromStr;

use crate::error::StandardizeError;

/// One of the 19 canonical 10-20 electrode sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Electrode {
    Fp1,
    F3,
    C3,
    P3,
    O1,
    F7,
    T3,
    T5,
    Fz,
    Cz,
    Pz,
    Fp2,
    F4,
    C4,
    P4,
    O2,
    F8,
    T4,
    T6,
}

/// The 10-20 electrodes in canonical output order.
pub const ELECTRODES_10_20: [Electrode; 19] = [
    Electrode::Fp1,
    Electrode::F3,
    Electrode::C3,
    Electrode::P3,
    Electrode::O1,
    Electrode::F7,
    Electrode::T3,
    Electrode::T5,
    Electrode::Fz,
    Electrode::Cz,
    Electrode::Pz,
    Electrode::Fp2,
    Electrode::F4,
    Electrode::C4,
    Electrode::P4,
    Electrode::O2,
    Electrode::F8,
    Electrode::T4,
    Electrode::T6,
];

impl Electrode {
    /// Canonical spelling (`"Fp1"`, `"Cz"`, …).
    pub const fn as_str(self) -> &'static str {
        match self {
            Electrode::Fp1 => "Fp1",
            Electrode::F3 => "F3",
            Electrode::C3 => "C3",
            Electrode::P3 => "P3",
            Electrode::O1 => "O1",
            Electrode::F7 => "F7",
            Electrode::T3 => "T3",
            Electrode::T5 => "T5",
            Electrode::Fz => "Fz",
            Electrode::Cz => "Cz",
            Electrode::Pz => "Pz",
            Electrode::Fp2 => "Fp2",
            Electrode::F4 => "F4",
            Electrode::C4 => "C4",
            Electrode::P4 => "P4",
            Electrode::O2 => "O2",
            Electrode::F8 => "F8",
            Electrode::T4 => "T4",
            Electrode::T6 => "T6",
        }
    }

    /// Parse a bare site name, accepting the modern 10-10 aliases
    /// (`T7`, `T8`, `P7`, `P8`) and the `01` misspelling of `O1`.
    fn parse_token(token: &str) -> Option<Electrode> {
        let upper = token.trim().to_ascii_uppercase();
        let e = match upper.as_str() {
            "FP1" => Electrode::Fp1,
            "F3" => Electrode::F3,
            "C3" => Electrode::C3,
            "P3" => Electrode::P3,
            "O1" | "01" => Electrode::O1,
            "F7" => Electrode::F7,
            "T3" | "T7" => Electrode::T3,
            "T5" | "P7" => Electrode::T5,
            "FZ" => Electrode::Fz,
            "CZ" => Electrode::Cz,
            "PZ" => Electrode::Pz,
            "FP2" => Electrode::Fp2,
            "F4" => Electrode::F4,
            "C4" => Electrode::C4,
            "P4" => Electrode::P4,
            "O2" => Electrode::O2,
            "F8" => Electrode::F8,
            "T4" | "T8" => Electrode::T4,
            "T6" | "P8" => Electrode::T6,
            _ => return None,
        };
        Some(e)
    }
}

impl fmt::Display for Electrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Electrode {
    type Err = StandardizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Electrode::parse_token(s).ok_or_else(|| StandardizeError::UnknownElectrode(s.to_string()))
    }
}

/// A bipolar derivation `anode − cathode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    pub anode: Electrode,
    pub cathode: Electrode,
}

impl Pair {
    pub const fn new(anode: Electrode, cathode: Electrode) -> Self {
        Self { anode, cathode }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.anode, self.cathode)
    }
}

impl FromStr for Pair {
    type Err = StandardizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || StandardizeError::UnknownElectrode(s.to_string());
        let (a, c) = s.split_once('-').ok_or_else(unknown)?;
        let anode = Electrode::parse_token(a).ok_or_else(unknown)?;
        let cathode = Electrode::parse_token(c).ok_or_else(unknown)?;
        Ok(Pair { anode, cathode })
    }
}

/// The longitudinal bipolar montage, in canonical order:
/// left parasagittal, left temporal, midline, right parasagittal, right temporal.
pub const DOUBLE_BANANA: [Pair; 18] = {
    use Electrode::*;
    [
        Pair::new(Fp1, F3),
        Pair::new(F3, C3),
        Pair::new(C3, P3),
        Pair::new(P3, O1),
        Pair::new(Fp1, F7),
        Pair::new(F7, T3),
        Pair::new(T3, T5),
        Pair::new(T5, O1),
        Pair::new(Fz, Cz),
        Pair::new(Cz, Pz),
        Pair::new(Fp2, F4),
        Pair::new(F4, C4),
        Pair::new(C4, P4),
        Pair::new(P4, O2),
        Pair::new(Fp2, F8),
        Pair::new(F8, T4),
        Pair::new(T4, T6),
        Pair::new(T6, O2),
    ]
};

// ── Channel label lookup ─────────────────────────────────────────────────

/// Drop the `EEG ` modality prefix used by TUH and Siena.
fn strip_prefix(label: &str) -> &str {
    let label = label.trim();
    match label.get(..4) {
        Some(p) if p.eq_ignore_ascii_case("EEG ") => label[4..].trim_start(),
        _ => label,
    }
}

/// Electrode of a monopolar channel label such as `"EEG FP1-REF"`, `"Fp1-LE"`
/// or `"T7"`. Anything after the first `-` is the recording reference and is
/// ignored.
pub fn electrode_of_label(label: &str) -> Option<Electrode> {
    let body = strip_prefix(label);
    let head = body.split('-').next().unwrap_or(body);
    Electrode::parse_token(head)
}

/// Pair of a bipolar channel label such as `"FP1-F7"` or `"T8-P8-0"`.
pub fn pair_of_label(label: &str) -> Option<Pair> {
    let mut parts = strip_prefix(label).split('-');
    let anode = Electrode::parse_token(parts.next()?)?;
    let cathode = Electrode::parse_token(parts.next()?)?;
    Some(Pair { anode, cathode })
}

/// Index of the first channel carrying electrode `e`.
pub fn find_electrode(labels: &[String], e: Electrode) -> Option<usize> {
    labels.iter().position(|l| electrode_of_label(l) == Some(e))
}

/// Index of the first channel carrying the bipolar derivation `pair`.
pub fn find_pair(labels: &[String], pair: Pair) -> Option<usize> {
    labels.iter().position(|l| pair_of_label(l) == Some(pair))
}
