use serde::Deserialize;

/// The seven supply fields a `modify` command may target.
pub const SUPPLY_FIELDS: [&str; 7] = [
    "meat",
    "vegetables",
    "fruits",
    "water",
    "antibiotics",
    "analgesics",
    "bandages",
];

/// Form body accepted by `POST /`.
///
/// `authenticate` carries `username`/`password`; every other command
/// carries `token`.
#[derive(Debug, Deserialize)]
pub struct CommandForm {
    pub command: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// A validated `modify <field> <amount>` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyCommand {
    pub field: String,
    pub amount: i64,
}

impl ModifyCommand {
    /// Parse a command string as a modify command.
    ///
    /// Valid only when the input has exactly 3 whitespace-separated tokens,
    /// the first is literally `modify`, the field is one of the seven known
    /// supply fields and the amount parses as a non-negative integer. A
    /// non-numeric amount is malformed, never a panic.
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.len() != 3 || parts[0] != "modify" {
            return None;
        }

        let field = parts[1];
        if !SUPPLY_FIELDS.contains(&field) {
            return None;
        }

        let amount: i64 = parts[2].parse().ok()?;
        if amount < 0 {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            amount,
        })
    }
}
