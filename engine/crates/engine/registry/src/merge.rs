use crate::{MetaType, OperationType, Registry, RegistryError, BUILTIN_SCALARS};

const ROOTS: [OperationType; 3] = [OperationType::Query, OperationType::Mutation, OperationType::Subscription];

impl Registry {
    /// Combines two independently declared registries into a new one.
    ///
    /// Type names must be disjoint, with two exceptions: built-in scalars are shared, and
    /// root types serving the same operation kind have their field sets unioned. A root
    /// field declared on both sides is a [`RegistryError::FieldConflict`]. Roots are paired
    /// by operation kind, so two roots of the same kind must also share a name.
    pub fn merge(&self, other: &Registry) -> Result<Registry, RegistryError> {
        let mut merged = self.clone();

        for operation_type in ROOTS {
            let Some(incoming) = other.root_type_name(operation_type) else {
                continue;
            };

            match self.root_type_name(operation_type) {
                Some(existing) if existing != incoming => {
                    return Err(RegistryError::SchemaConflict(incoming.to_string()));
                }
                Some(_) => {}
                None => merged.set_root_type_name(operation_type, incoming),
            }
        }

        for (name, incoming) in &other.types {
            let shared_root = ROOTS.iter().any(|operation_type| {
                self.root_type_name(*operation_type) == Some(name.as_str())
                    && other.root_type_name(*operation_type) == Some(name.as_str())
            });

            match (merged.types.get_mut(name), incoming) {
                (None, _) => {
                    merged.types.insert(name.clone(), incoming.clone());
                }
                (Some(MetaType::Scalar(_)), MetaType::Scalar(_)) if BUILTIN_SCALARS.contains(&name.as_str()) => {}
                (Some(MetaType::Object(existing)), MetaType::Object(incoming)) if shared_root => {
                    for field in incoming.fields.values() {
                        if existing.fields.contains_key(&field.name) {
                            return Err(RegistryError::FieldConflict {
                                type_name: name.clone(),
                                field_name: field.name.clone(),
                            });
                        }
                        existing.fields.insert(field.name.clone(), field.clone());
                    }
                }
                (Some(_), _) => return Err(RegistryError::SchemaConflict(name.clone())),
            }
        }

        Ok(merged)
    }

    fn set_root_type_name(&mut self, operation_type: OperationType, name: &str) {
        match operation_type {
            OperationType::Query => self.query_type = name.to_string(),
            OperationType::Mutation => self.mutation_type = Some(name.to_string()),
            OperationType::Subscription => self.subscription_type = Some(name.to_string()),
        }
    }
}
