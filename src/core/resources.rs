//! Registry of the CRM resources the client can manage.
//!
//! Every list/detail/create screen of the admin UI is one entry here: the REST
//! path, a display title, the default column layout and, where the backend
//! exposes one, the boolean flag that `toggle` flips.

use crate::display::table::{ColumnDescriptor, ColumnSet};
use crate::error::{CliError, DisplayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub visible: bool,
}

const fn col(key: &'static str, label: &'static str) -> ColumnSpec {
    ColumnSpec {
        key,
        label,
        visible: true,
    }
}

const fn hidden(key: &'static str, label: &'static str) -> ColumnSpec {
    ColumnSpec {
        key,
        label,
        visible: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDef {
    /// Command-line name, e.g. `company-types`
    pub name: &'static str,
    /// Path relative to the API base URL
    pub path: &'static str,
    pub title: &'static str,
    pub columns: &'static [ColumnSpec],
    /// Boolean field flipped by `toggle`
    pub status_field: Option<&'static str>,
}

impl ResourceDef {
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Fresh column set carrying the default visibility
    pub fn column_set(&self) -> Result<ColumnSet, DisplayError> {
        let columns = self
            .columns
            .iter()
            .map(|spec| {
                let column = ColumnDescriptor::new(spec.key, spec.label);
                if spec.visible { column } else { column.hidden() }
            })
            .collect();
        ColumnSet::new(columns)
    }

    pub fn has_status_toggle(&self) -> bool {
        self.status_field.is_some()
    }
}

const ACTIVE: &str = "is_active";

pub const RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        name: "accounts",
        path: "accounts",
        title: "Accounts",
        columns: &[
            col("id", "ID"),
            col("name", "Account Name"),
            col("email", "Email"),
            col("phone", "Phone"),
            col("industry", "Industry"),
            col("owner", "Owner"),
            hidden("website", "Website"),
            hidden("billing_address", "Billing Address"),
            col("created_at", "Created"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "transactions",
        path: "transactions",
        title: "Transactions",
        columns: &[
            col("id", "ID"),
            col("reference", "Reference"),
            col("account", "Account"),
            col("type", "Type"),
            col("amount", "Amount"),
            col("status", "Status"),
            col("transaction_date", "Date"),
            hidden("notes", "Notes"),
        ],
        status_field: None,
    },
    ResourceDef {
        name: "leads",
        path: "leads",
        title: "Leads",
        columns: &[
            col("id", "ID"),
            col("first_name", "First Name"),
            col("last_name", "Last Name"),
            col("email", "Email"),
            col("phone", "Phone"),
            col("company", "Company"),
            col("source", "Source"),
            col("status", "Status"),
            hidden("assigned_to", "Assigned To"),
            col("created_at", "Created"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "opportunities",
        path: "opportunities",
        title: "Opportunities",
        columns: &[
            col("id", "ID"),
            col("name", "Opportunity"),
            col("account", "Account"),
            col("stage", "Stage"),
            col("amount", "Amount"),
            hidden("probability", "Probability"),
            col("close_date", "Close Date"),
            hidden("owner", "Owner"),
        ],
        status_field: None,
    },
    ResourceDef {
        name: "companies",
        path: "companies",
        title: "Companies",
        columns: &[
            col("id", "ID"),
            col("name", "Company"),
            col("company_type", "Type"),
            col("industry", "Industry"),
            col("email", "Email"),
            col("phone", "Phone"),
            hidden("address", "Address"),
            hidden("logo", "Logo"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "company-types",
        path: "company-types",
        title: "Company Types",
        columns: &[
            col("id", "ID"),
            col("name", "Name"),
            col("description", "Description"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "departments",
        path: "departments",
        title: "Departments",
        columns: &[
            col("id", "ID"),
            col("name", "Name"),
            col("description", "Description"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "designations",
        path: "designations",
        title: "Designations",
        columns: &[
            col("id", "ID"),
            col("name", "Name"),
            col("department", "Department"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "staff",
        path: "staff",
        title: "Staff",
        columns: &[
            col("id", "ID"),
            col("first_name", "First Name"),
            col("last_name", "Last Name"),
            col("email", "Email"),
            col("phone", "Phone"),
            col("department", "Department"),
            col("designation", "Designation"),
            hidden("joining_date", "Joining Date"),
            hidden("avatar", "Avatar"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "teams",
        path: "teams",
        title: "Teams",
        columns: &[
            col("id", "ID"),
            col("name", "Team"),
            col("lead", "Team Lead"),
            hidden("members", "Members"),
            col(ACTIVE, "Active"),
        ],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "projects",
        path: "projects",
        title: "Projects",
        columns: &[
            col("id", "ID"),
            col("name", "Project"),
            col("account", "Account"),
            col("manager", "Manager"),
            col("start_date", "Start Date"),
            col("end_date", "End Date"),
            col("status", "Status"),
            hidden("budget", "Budget"),
        ],
        status_field: None,
    },
    ResourceDef {
        name: "sources",
        path: "sources",
        title: "Lead Sources",
        columns: &[col("id", "ID"), col("name", "Name"), col(ACTIVE, "Active")],
        status_field: Some(ACTIVE),
    },
    ResourceDef {
        name: "industries",
        path: "industries",
        title: "Industries",
        columns: &[col("id", "ID"), col("name", "Name"), col(ACTIVE, "Active")],
        status_field: Some(ACTIVE),
    },
];

/// Case-insensitive lookup; underscores are accepted for dashes
pub fn find(name: &str) -> Option<&'static ResourceDef> {
    let wanted = name.trim().to_lowercase().replace('_', "-");
    RESOURCES.iter().find(|resource| resource.name == wanted)
}

pub fn resolve(name: &str) -> Result<&'static ResourceDef, CliError> {
    find(name).ok_or_else(|| CliError::UnknownResource {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_and_column_keys_are_unique() {
        let mut names = HashSet::new();
        for resource in RESOURCES {
            assert!(names.insert(resource.name), "duplicate {}", resource.name);

            let keys: HashSet<&str> = resource.columns.iter().map(|c| c.key).collect();
            assert_eq!(keys.len(), resource.columns.len(), "{}", resource.name);
            assert_eq!(
                resource.column_set().unwrap().columns().len(),
                resource.columns.len()
            );
        }
    }

    #[test]
    fn test_status_field_is_a_column() {
        for resource in RESOURCES {
            if let Some(field) = resource.status_field {
                assert!(resource.columns.iter().any(|c| c.key == field));
            }
        }
    }

    #[test]
    fn test_find_accepts_aliases() {
        assert_eq!(find("company_types").map(|r| r.path), Some("company-types"));
        assert_eq!(find(" Leads ").map(|r| r.name), Some("leads"));
        assert!(find("widgets").is_none());
        assert!(matches!(
            resolve("widgets"),
            Err(CliError::UnknownResource { name }) if name == "widgets"
        ));
    }

    #[test]
    fn test_column_set_keeps_default_visibility() {
        let accounts = find("accounts").unwrap();
        let columns = accounts.column_set().unwrap();
        assert!(!columns.get("website").unwrap().visible);
        assert!(columns.get("name").unwrap().visible);
        assert_eq!(accounts.item_path("12"), "accounts/12");
    }

    #[test]
    fn test_column_set_rejects_duplicate_keys() {
        const BROKEN_COLUMNS: &[ColumnSpec] =
            &[col("id", "ID"), col("name", "Name"), hidden("id", "Identifier")];
        let broken = ResourceDef {
            name: "broken",
            path: "broken",
            title: "Broken",
            columns: BROKEN_COLUMNS,
            status_field: None,
        };
        assert!(matches!(
            broken.column_set(),
            Err(DisplayError::DuplicateColumn(key)) if key == "id"
        ));
    }
}
