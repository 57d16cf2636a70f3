use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: i32,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_expression: Option<String>,
    pub is_primary_key: bool,
    pub reference: Option<ColumnReference>,
}

/// The target of a foreign-key column.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub table: String,
    pub column: String,
}

impl Column {
    pub fn is_foreign_key(&self) -> bool {
        self.reference.is_some()
    }

    /// True when the column default draws values from a sequence, i.e. the
    /// column was declared with one of the serial pseudo-types.
    pub fn is_serial(&self) -> bool {
        self.default_expression
            .as_deref()
            .is_some_and(|d| d.contains("nextval("))
    }

    /// The type to emit when recreating the column, folding sequence-backed
    /// integer types back into their serial shorthand.
    pub fn reconstructed_data_type(&self) -> &str {
        if self.is_serial() {
            match self.data_type.as_str() {
                "smallint" => "smallserial",
                "bigint" => "bigserial",
                "integer" => "serial",
                other => other,
            }
        } else {
            &self.data_type
        }
    }

    /// The default expression to emit when recreating the column. Serial
    /// columns carry their default implicitly in the type, and explicit
    /// defaults lose their type-cast suffix.
    pub fn reconstructed_default(&self) -> Option<&str> {
        if self.is_serial() {
            return None;
        }

        self.default_expression.as_deref().map(|d| match d.find("::") {
            Some(index) => &d[..index],
            None => d,
        })
    }

    pub fn get_simplified_data_type(&self) -> SimplifiedDataType {
        match self.data_type.as_str() {
            "bigint" | "integer" | "smallint" | "real" | "double precision" => {
                SimplifiedDataType::Number
            }
            "boolean" => SimplifiedDataType::Bool,
            _ => SimplifiedDataType::Text,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SimplifiedDataType {
    Number,
    Text,
    Bool,
}
