// src/pipeline/names.rs

use uuid::Uuid;

/// Source of collision-free tokens for per-request artifact names.
pub trait NameGenerator: Send + Sync {
    fn unique(&self) -> String;
}

/// Random v4 UUIDs in their 32-character simple form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNames;

impl NameGenerator for UuidNames {
    fn unique(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_names_do_not_repeat() {
        let names: HashSet<String> = (0..256).map(|_| UuidNames.unique()).collect();
        assert_eq!(names.len(), 256);
        assert!(names.iter().all(|n| n.len() == 32));
    }
}
