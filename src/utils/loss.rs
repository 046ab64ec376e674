//! Loss reporting for constructs the converters could not map faithfully.

use serde::Serialize;
use sfudoc_ir::Loss as IrLoss;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossKind {
    UnknownCommand,
    UnknownEnvironment,
    UnsupportedMarkup,
    MissingImage,
    Structure,
    Other,
}

impl LossKind {
    /// Classify the kind tag a frontend or registry pass attached to a loss.
    pub fn classify(tag: &str) -> Self {
        match tag {
            "unknown-command" | "math" => LossKind::UnknownCommand,
            "unknown-environment" => LossKind::UnknownEnvironment,
            "unsupported-tag" | "unsupported-inline" | "inline-image" | "cell-span"
            | "table-caption" | "item-label" => LossKind::UnsupportedMarkup,
            "missing-image" => LossKind::MissingImage,
            "ragged-row" | "empty-table" | "duplicate-title-page" | "template-title-page"
            | "figure-without-image" | "unmatched-end" | "unclosed-group"
            | "unclosed-environment" | "column-spec" => LossKind::Structure,
            _ => LossKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossRecord {
    pub id: String,
    pub kind: LossKind,
    pub name: String,
    pub message: String,
}

impl LossRecord {
    pub fn from_ir_loss(id: String, loss: &IrLoss) -> Self {
        Self {
            id,
            kind: LossKind::classify(&loss.kind),
            name: loss.kind.clone(),
            message: loss.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossReport {
    pub source_lang: String,
    pub target_lang: String,
    pub losses: Vec<LossRecord>,
}

impl LossReport {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            losses: Vec::new(),
        }
    }

    pub fn from_ir_losses(
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        losses: &[IrLoss],
    ) -> Self {
        let mut report = Self::new(source_lang, target_lang);
        report.extend(losses);
        report
    }

    pub fn extend(&mut self, losses: &[IrLoss]) {
        for loss in losses {
            let id = format!("L{:04}", self.losses.len() + 1);
            self.losses.push(LossRecord::from_ir_loss(id, loss));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn count(&self, kind: LossKind) -> usize {
        self.losses.iter().filter(|record| record.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    /// One line per loss, for terminal output and WASM warnings.
    pub fn messages(&self) -> Vec<String> {
        self.losses
            .iter()
            .map(|record| format!("[{}] {}", record.name, record.message))
            .collect()
    }
}
