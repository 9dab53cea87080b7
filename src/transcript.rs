/// Ordered, caller-visible log of one operation
///
/// Every line is forwarded to the `log` facade as it is recorded, so the text
/// handed back to the caller and the process log never disagree.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    lines: Vec<String>,
    warnings: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::warn!("{line}");
        self.lines.push(format!("WARNING: {line}"));
        self.warnings += 1;
    }

    /// Appends lines that were already logged elsewhere
    pub fn extend(&mut self, other: Transcript) {
        self.warnings += other.warnings;
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
