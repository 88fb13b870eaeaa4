// CloudFormation intrinsic function encodings
//
// References are opaque data: they are constructed, inspected and passed through,
// never evaluated. Whatever shape a template author used must survive a
// parse -> serialize cycle unchanged.

use serde_json::{json, Map, Value};

pub const REF: &str = "Ref";
pub const GET_ATT: &str = "Fn::GetAtt";
pub const SUB: &str = "Fn::Sub";
pub const JOIN: &str = "Fn::Join";

/// A symbolic reference understood by the deployment engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    /// `{"Ref": "LogicalId"}`
    Ref(String),
    /// `{"Fn::GetAtt": ["LogicalId", "Attribute"]}` (or the dotted string form)
    GetAtt {
        logical_id: String,
        attribute: String,
    },
    /// `{"Fn::Sub": "template"}` when `variables` is `None`,
    /// `{"Fn::Sub": ["template", {..}]}` otherwise
    Sub {
        template: String,
        variables: Option<Map<String, Value>>,
    },
    /// `{"Fn::Join": ["delimiter", [parts..]]}`
    Join { delimiter: String, parts: Vec<Value> },
}

impl Intrinsic {
    /// Recognise an intrinsic function object. Anything else yields `None`.
    pub fn parse(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        let (key, body) = object.iter().next()?;

        match key.as_str() {
            REF => body.as_str().map(|id| Intrinsic::Ref(id.to_string())),
            GET_ATT => match body {
                Value::Array(items) if items.len() == 2 => Some(Intrinsic::GetAtt {
                    logical_id: items[0].as_str()?.to_string(),
                    attribute: items[1].as_str()?.to_string(),
                }),
                Value::String(dotted) => {
                    let (logical_id, attribute) = dotted.split_once('.')?;
                    Some(Intrinsic::GetAtt {
                        logical_id: logical_id.to_string(),
                        attribute: attribute.to_string(),
                    })
                }
                _ => None,
            },
            SUB => match body {
                Value::String(template) => Some(Intrinsic::Sub {
                    template: template.clone(),
                    variables: None,
                }),
                Value::Array(items) if items.len() == 2 => Some(Intrinsic::Sub {
                    template: items[0].as_str()?.to_string(),
                    variables: Some(items[1].as_object()?.clone()),
                }),
                _ => None,
            },
            JOIN => match body {
                Value::Array(items) if items.len() == 2 => Some(Intrinsic::Join {
                    delimiter: items[0].as_str()?.to_string(),
                    parts: items[1].as_array()?.clone(),
                }),
                _ => None,
            },
            _ => None,
        }
    }

    /// The resource a `Ref` or `Fn::GetAtt` points at.
    pub fn target(&self) -> Option<&str> {
        match self {
            Intrinsic::Ref(id) => Some(id.as_str()),
            Intrinsic::GetAtt { logical_id, .. } => Some(logical_id.as_str()),
            _ => None,
        }
    }

    /// Look up a `Fn::Sub` variable by name.
    pub fn sub_variable(&self, name: &str) -> Option<&Value> {
        match self {
            Intrinsic::Sub {
                variables: Some(variables),
                ..
            } => variables.get(name),
            _ => None,
        }
    }
}

impl From<Intrinsic> for Value {
    fn from(intrinsic: Intrinsic) -> Self {
        match intrinsic {
            Intrinsic::Ref(id) => json!({ REF: id }),
            Intrinsic::GetAtt {
                logical_id,
                attribute,
            } => json!({ GET_ATT: [logical_id, attribute] }),
            Intrinsic::Sub {
                template,
                variables: None,
            } => json!({ SUB: template }),
            Intrinsic::Sub {
                template,
                variables: Some(variables),
            } => json!({ SUB: [template, variables] }),
            Intrinsic::Join { delimiter, parts } => json!({ JOIN: [delimiter, parts] }),
        }
    }
}

/// `{"Ref": logical_id}`
pub fn reference(logical_id: &str) -> Value {
    Intrinsic::Ref(logical_id.to_string()).into()
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    Intrinsic::GetAtt {
        logical_id: logical_id.to_string(),
        attribute: attribute.to_string(),
    }
    .into()
}

/// `{"Fn::Sub": [template, variables]}`
pub fn sub(template: &str, variables: Map<String, Value>) -> Value {
    Intrinsic::Sub {
        template: template.to_string(),
        variables: Some(variables),
    }
    .into()
}

/// Placeholder names in a `Fn::Sub` template, in order of appearance.
///
/// `${!Literal}` escapes are skipped.
pub fn sub_placeholders(template: &str) -> Vec<&str> {
    let mut placeholders = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.starts_with('!') {
            placeholders.push(name);
        }
        rest = &after[end + 1..];
    }
    placeholders
}

/// Rewrite `${from}` placeholders in a `Fn::Sub` template to `${to}`.
pub fn replace_placeholder(template: &str, from: &str, to: &str) -> String {
    template.replace(&format!("${{{from}}}"), &format!("${{{to}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_encoding() {
        assert_eq!(
            Intrinsic::parse(&json!({"Ref": "Fn1"})),
            Some(Intrinsic::Ref("Fn1".to_string()))
        );
        assert_eq!(
            Intrinsic::parse(&json!({"Fn::GetAtt": "Fn1.Arn"})),
            Some(Intrinsic::GetAtt {
                logical_id: "Fn1".to_string(),
                attribute: "Arn".to_string()
            })
        );
        let join = Intrinsic::parse(&json!({"Fn::Join": ["", ["a", {"Ref": "Fn1"}]]})).unwrap();
        assert!(matches!(join, Intrinsic::Join { ref parts, .. } if parts.len() == 2));
        assert!(Intrinsic::parse(&json!({"Ref": "A", "Extra": 1})).is_none());
        assert!(Intrinsic::parse(&json!("plain")).is_none());
    }

    #[test]
    fn sub_keeps_its_original_form() {
        let short = json!({"Fn::Sub": "arn:${AWS::Partition}:x"});
        let long = json!({"Fn::Sub": ["x${Name}", {"Name": "y"}]});
        assert_eq!(Value::from(Intrinsic::parse(&short).unwrap()), short);
        assert_eq!(Value::from(Intrinsic::parse(&long).unwrap()), long);
    }

    #[test]
    fn placeholders_skip_escapes() {
        let template = "arn:${AWS::Partition}:${!Literal}/${Fn1.Arn}/invocations";
        assert_eq!(
            sub_placeholders(template),
            vec!["AWS::Partition", "Fn1.Arn"]
        );
        assert_eq!(
            replace_placeholder(template, "Fn1.Arn", "Fn1Aliaslive"),
            "arn:${AWS::Partition}:${!Literal}/${Fn1Aliaslive}/invocations"
        );
    }
}
