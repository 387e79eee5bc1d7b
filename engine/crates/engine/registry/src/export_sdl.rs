use std::fmt::Write;

use crate::{MetaField, MetaType, Registry, BUILTIN_SCALARS};

impl Registry {
    /// Prints the registry back as SDL. Built-in scalars are omitted.
    pub fn export_sdl(&self) -> String {
        let mut sdl = String::new();

        if self.query_type != "Query"
            || self.mutation_type.as_deref().is_some_and(|name| name != "Mutation")
            || self.subscription_type.as_deref().is_some_and(|name| name != "Subscription")
        {
            sdl.push_str("schema {\n");
            writeln!(sdl, "  query: {}", self.query_type).ok();
            if let Some(mutation) = &self.mutation_type {
                writeln!(sdl, "  mutation: {mutation}").ok();
            }
            if let Some(subscription) = &self.subscription_type {
                writeln!(sdl, "  subscription: {subscription}").ok();
            }
            sdl.push_str("}\n");
        }

        let types = self
            .types
            .values()
            .filter(|ty| !BUILTIN_SCALARS.contains(&ty.name()));

        for ty in types {
            if !sdl.is_empty() {
                sdl.push('\n');
            }

            match ty {
                MetaType::Scalar(scalar) => {
                    export_description(&mut sdl, scalar.description.as_deref(), "");
                    writeln!(sdl, "scalar {}", scalar.name).ok();
                }
                MetaType::Enum(enum_type) => {
                    export_description(&mut sdl, enum_type.description.as_deref(), "");
                    writeln!(sdl, "enum {} {{", enum_type.name).ok();
                    for value in &enum_type.values {
                        writeln!(sdl, "  {value}").ok();
                    }
                    sdl.push_str("}\n");
                }
                MetaType::Object(object) => {
                    export_description(&mut sdl, object.description.as_deref(), "");
                    writeln!(sdl, "type {} {{", object.name).ok();
                    for field in object.fields.values() {
                        export_field(&mut sdl, field);
                    }
                    sdl.push_str("}\n");
                }
            }
        }

        sdl
    }
}

fn export_field(sdl: &mut String, field: &MetaField) {
    export_description(sdl, field.description.as_deref(), "  ");
    write!(sdl, "  {}", field.name).ok();

    if !field.args.is_empty() {
        let args = field
            .args
            .values()
            .map(|arg| match &arg.default_value {
                Some(default_value) => format!("{}: {} = {default_value}", arg.name, arg.ty),
                None => format!("{}: {}", arg.name, arg.ty),
            })
            .collect::<Vec<_>>();
        write!(sdl, "({})", args.join(", ")).ok();
    }

    writeln!(sdl, ": {}", field.ty).ok();
}

fn export_description(sdl: &mut String, description: Option<&str>, indent: &str) {
    if let Some(description) = description {
        writeln!(sdl, "{indent}\"\"\"{description}\"\"\"").ok();
    }
}
