use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Settings {
    inner: FxHashMap<Setting, bool>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            inner: FxHashMap::default(),
        }
    }

    pub fn enable(&mut self, setting: Setting) {
        self.inner.insert(setting, true);
    }

    pub fn disable(&mut self, setting: Setting) {
        self.inner.insert(setting, false);
    }

    pub fn is_enabled(&self, setting: &Setting) -> bool {
        match self.inner.get(setting) {
            Some(v) => *v,
            _ => false,
        }
    }

    pub fn as_vec(&self) -> Vec<(Setting, bool)> {
        let mut settings = self
            .inner
            .iter()
            .map(|p| (p.0.clone(), *p.1))
            .collect::<Vec<_>>();
        settings.sort_by_key(|(s, _)| s.to_string());
        settings
    }
}

impl Default for Settings {
    fn default() -> Settings {
        let mut settings = Settings::new();

        settings.disable(Setting::TraceExecution);
        settings.disable(Setting::PrintCode);

        settings
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Setting {
    // log every executed instruction together with the stack
    TraceExecution,
    // disassemble chunks before they are executed
    PrintCode,
}

impl std::str::FromStr for Setting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Setting::TraceExecution),
            "print-code" => Ok(Setting::PrintCode),
            other => Err(format!("Unknown setting {}", other)),
        }
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        let name = match self {
            Setting::TraceExecution => "trace",
            Setting::PrintCode => "print-code",
        };

        fmt.write_str(name)
    }
}
