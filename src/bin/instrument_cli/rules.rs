//! Rules command - list the redirected calls

use anyhow::Result;
use clap::Parser;
use instrument_core::{rules, SHIM_OWNER};
use instrument_types::{binary_name, MethodDescriptor};
use serde::Serialize;

use super::output::print_json;

#[derive(Parser, Debug)]
pub struct RulesCmd {
    /// Only show rules for this owner (internal or dotted name)
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
struct RuleOutput {
    owner: &'static str,
    name: &'static str,
    descriptor: &'static str,
    shim_owner: &'static str,
    shim_name: &'static str,
    shim_descriptor: &'static str,
}

impl RulesCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let owner = self.owner.as_deref().map(instrument_types::internal_name);
        let selected: Vec<_> = rules()
            .iter()
            .filter(|rule| owner.as_deref().map_or(true, |o| rule.call.owner == o))
            .collect();

        if json_output {
            let output: Vec<RuleOutput> = selected
                .iter()
                .map(|rule| RuleOutput {
                    owner: rule.call.owner,
                    name: rule.call.name,
                    descriptor: rule.call.descriptor,
                    shim_owner: rule.target.owner(),
                    shim_name: rule.target.name,
                    shim_descriptor: rule.target.descriptor,
                })
                .collect();
            return print_json(&output);
        }

        println!("Redirect target: {}\n", binary_name(SHIM_OWNER));
        for rule in &selected {
            let original = MethodDescriptor::parse(rule.call.descriptor)?;
            let shim = MethodDescriptor::parse(rule.target.descriptor)?;
            println!(
                "{}: {}\n    -> {}",
                binary_name(rule.call.owner),
                original.render(rule.call.name),
                shim.render(rule.target.name)
            );
        }
        println!("\n{} rule(s)", selected.len());
        Ok(())
    }
}
