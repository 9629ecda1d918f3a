use super::service::ServiceDefinition;

const SERVICES: &[(&str, &str)] = &[
    ("amplify", include_str!("../../data/amplify.json")),
    ("ecr", include_str!("../../data/ecr.json")),
    ("s3", include_str!("../../data/s3.json")),
];

/// The service definitions shipped with the crate.
pub fn definitions() -> json::Result<Vec<ServiceDefinition>> {
    SERVICES.iter().map(|(_, data)| ServiceDefinition::try_from(*data)).collect()
}

#[cfg(test)]
mod test {
    use super::{definitions, SERVICES};
    use crate::catalog::ServiceCatalogEntry;

    #[test]
    fn bundled_definitions_are_named_after_their_files() {
        let definitions = definitions().unwrap();
        for ((name, _), definition) in SERVICES.iter().zip(&definitions) {
            assert_eq!(*name, definition.namespace);
        }
    }

    #[test]
    fn bundled_definitions_build() {
        for definition in definitions().unwrap() {
            let namespace = definition.namespace.clone();
            assert!(ServiceCatalogEntry::from_definition(definition).is_ok(), "{} should build", namespace);
        }
    }
}
