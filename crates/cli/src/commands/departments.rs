//! Departments command handler.
//!
//! Prints the departments a role is authorized to access.

use clap::Args;
use parley_core::{AccessPolicy, AppResult, Role};

/// Show the departments a role may access
#[derive(Args, Debug)]
pub struct DepartmentsCommand {
    /// The role to look up
    #[arg(short, long)]
    pub role: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DepartmentsCommand {
    /// Execute the departments command.
    pub fn execute(&self) -> AppResult<()> {
        let role: Role = self.role.parse()?;
        let departments = AccessPolicy::allowed_departments(role);

        if self.json {
            let output = serde_json::json!({
                "role": role,
                "departments": departments,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Role '{}' may access:", role);
            for department in departments {
                println!("- {}", department);
            }
        }

        Ok(())
    }
}
