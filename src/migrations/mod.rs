mod m0001_entity_tables;
mod m0002_crawl_state;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_entity_tables::migration());
    reg.register(m0002_crawl_state::migration());
    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let reg = registry();
        let order = reg.resolve_order().unwrap();
        assert_eq!(order, vec!["0001_entity_tables", "0002_crawl_state"]);
    }
}
