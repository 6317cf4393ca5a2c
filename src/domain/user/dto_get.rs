/// How multiple filters combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// A user matches if any filter matches (OR)
    #[default]
    Any,
    /// A user matches only if every filter matches (AND)
    All,
}

/// User search filters: case-insensitive substring matches.
#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub mode: FilterMode,
}

impl GetUserDto {
    /// Filters with empty values dropped.
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            name: keep(self.name),
            email: keep(self.email),
            telephone: keep(self.telephone),
            mode: self.mode,
        }
    }

    pub fn has_filters(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.telephone.is_some()
    }

    /// Case-insensitive (Unicode lowercase) substring match of every set filter.
    pub fn matches(&self, name: &str, email: &str, telephone: &str) -> bool {
        let checks: Vec<bool> = [
            (self.name.as_deref(), name),
            (self.email.as_deref(), email),
            (self.telephone.as_deref(), telephone),
        ]
        .into_iter()
        .filter_map(|(needle, haystack)| {
            needle.map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        })
        .collect();

        if checks.is_empty() {
            return true;
        }

        match self.mode {
            FilterMode::Any => checks.iter().any(|c| *c),
            FilterMode::All => checks.iter().all(|c| *c),
        }
    }
}
