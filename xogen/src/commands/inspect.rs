use clap::Args;
use eyre::{Context, Result};
use serde_json::{Value, json};
use xogen_codegen::Loaded;
use xogen_codegen_go::Generator;
use xogen_core::Engine;
use xogen_loader::LoaderRegistry;

use super::{UnwrapOrExit, args::GenArgs, connect_all};

#[derive(Args)]
pub struct InspectCommand {
    #[command(flatten)]
    pub args: GenArgs,
}

impl InspectCommand {
    pub fn run(&self) -> Result<()> {
        let settings = self.args.to_config()?.resolve().unwrap_or_exit();
        let registry = LoaderRegistry::with_defaults();
        let connections = connect_all(&settings.dsns).unwrap_or_exit();

        let loaded = Generator::new(&settings)
            .inspect(&registry, connections)
            .unwrap_or_exit();
        let doc = to_json(&loaded).wrap_err("failed to serialize the schema model")?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
        Ok(())
    }
}

/// One object per connection, tagged with its driver.
fn to_json(loaded: &[(Engine, Loaded)]) -> serde_json::Result<Value> {
    let mut items = Vec::with_capacity(loaded.len());
    for (engine, l) in loaded {
        let item = match l {
            Loaded::Schema(def) => json!({
                "driver": engine.as_str(),
                "definition": serde_json::to_value(def)?,
            }),
            Loaded::Query { schema, query } => json!({
                "driver": engine.as_str(),
                "schema": schema,
                "query": serde_json::to_value(query)?,
            }),
        };
        items.push(item);
    }
    Ok(Value::Array(items))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use xogen_ir::SchemaDefinition;

    use super::*;

    #[test]
    fn test_to_json_tags_driver() {
        let def = SchemaDefinition {
            schema: "BOOKTEST".to_string(),
            tables: Vec::new(),
            views: Vec::new(),
            engines: vec![Engine::Oracle],
            known_types: BTreeSet::new(),
        };
        let doc = to_json(&[(Engine::Oracle, Loaded::Schema(def))]).unwrap();

        assert_eq!(doc[0]["driver"], "godror");
        assert_eq!(doc[0]["definition"]["schema"], "BOOKTEST");
        assert!(doc[0]["definition"]["tables"].as_array().unwrap().is_empty());
    }
}
