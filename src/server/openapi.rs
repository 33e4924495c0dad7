// OpenAPI document generation
//
// Builds an OpenAPI 3.1 document from a registry snapshot: one POST
// operation per tool, request schema derived from the compiled input
// schema, response content type from the declared output format.

use utoipa::openapi::{
    path::{HttpMethod, OperationBuilder},
    request_body::RequestBodyBuilder,
    schema::{ObjectBuilder, Schema, SchemaFormat, SchemaType, Type},
    Content, InfoBuilder, OpenApi, OpenApiBuilder, PathItem, PathsBuilder, RefOr, Required,
    ResponseBuilder,
};

use crate::config::OutputFormat;
use crate::registry::ToolRegistry;
use crate::schema::{ArgType, PropertySchema, ToolInputSchema};

/// Generate the OpenAPI document for a registry snapshot.
///
/// The compiled schemas are deterministic, so absent declaration changes
/// the document is byte-stable across reloads.
pub fn openapi_doc(registry: &ToolRegistry, name: &str, version: &str) -> OpenApi {
    let mut paths = PathsBuilder::new();

    for tool in registry.iter() {
        let identity = tool.identity();
        let path = format!("/{}", identity);

        let request_body = RequestBodyBuilder::new()
            .content(
                "application/json",
                Content::new(Some(input_schema(&tool.schema))),
            )
            .required(Some(Required::True))
            .build();

        let response = ResponseBuilder::new()
            .description("OK")
            .content(
                response_content_type(tool.declaration.output.format),
                Content::new(Some(response_schema(tool.declaration.output.format))),
            )
            .build();

        let operation = OperationBuilder::new()
            .operation_id(Some(identity.replace('/', "_")))
            .summary(Some(tool.declaration.name.clone()))
            .description(Some(tool.declaration.description.clone()))
            .request_body(Some(request_body))
            .response("200", response)
            .build();

        paths = paths.path(path, PathItem::new(HttpMethod::Post, operation));
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(name)
                .version(version)
                .description(Some(format!("{} MCP server", name)))
                .build(),
        )
        .paths(paths.build())
        .build()
}

fn input_schema(schema: &ToolInputSchema) -> Schema {
    let mut object = ObjectBuilder::new().schema_type(SchemaType::Type(Type::Object));

    for (name, prop) in &schema.properties {
        object = object.property(name, property_schema(prop));
    }
    for name in &schema.required {
        object = object.required(name);
    }

    Schema::Object(object.build())
}

fn property_schema(prop: &PropertySchema) -> RefOr<Schema> {
    let ty = match prop.arg_type {
        ArgType::String => Type::String,
        ArgType::Integer => Type::Integer,
        ArgType::Number => Type::Number,
        ArgType::Boolean => Type::Boolean,
    };

    let mut builder = ObjectBuilder::new().schema_type(SchemaType::Type(ty));
    if !prop.description.is_empty() {
        builder = builder.description(Some(prop.description.clone()));
    }
    if !prop.enum_values.is_empty() {
        let values: Vec<serde_json::Value> = prop
            .enum_values
            .iter()
            .filter_map(|v| serde_json::to_value(v).ok())
            .collect();
        builder = builder.enum_values(Some(values));
    }

    RefOr::T(Schema::Object(builder.build()))
}

fn response_content_type(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "application/json",
        OutputFormat::Image | OutputFormat::Audio => "application/octet-stream",
        OutputFormat::Text => "text/plain",
    }
}

fn response_schema(format: OutputFormat) -> Schema {
    let builder = match format {
        OutputFormat::Json => ObjectBuilder::new().schema_type(SchemaType::Type(Type::Object)),
        OutputFormat::Image | OutputFormat::Audio => ObjectBuilder::new()
            .schema_type(SchemaType::Type(Type::String))
            .format(Some(SchemaFormat::Custom("binary".to_string()))),
        OutputFormat::Text => ObjectBuilder::new().schema_type(SchemaType::Type(Type::String)),
    };
    Schema::Object(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ArgumentDeclaration, CommandSpec, OutputSpec, ToolDeclaration,
    };
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::build(&[ToolDeclaration {
            namespace: "util".to_string(),
            name: "echo".to_string(),
            description: "echo message".to_string(),
            run: CommandSpec {
                cmd: "echo".to_string(),
                args: vec!["{{ msg }}".to_string()],
            },
            input: vec![
                ArgumentDeclaration {
                    name: "msg".to_string(),
                    arg_type: "string".to_string(),
                    description: "message".to_string(),
                    enum_values: vec![],
                    required: true,
                },
                ArgumentDeclaration {
                    name: "level".to_string(),
                    arg_type: "integer".to_string(),
                    description: "verbosity".to_string(),
                    enum_values: vec![json!(1), json!(2)],
                    required: false,
                },
            ],
            output: OutputSpec::default(),
        }])
        .unwrap()
    }

    #[test]
    fn test_openapi_doc_shape() {
        let doc = openapi_doc(&registry(), "mcpd", "0.1.0");
        let value = serde_json::to_value(&doc).unwrap();

        assert!(value["openapi"].as_str().unwrap().starts_with("3.1"));
        assert_eq!(value["info"]["title"], "mcpd");

        let op = &value["paths"]["/util/echo"]["post"];
        assert_eq!(op["operationId"], "util_echo");

        let schema = &op["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["msg"]["type"], "string");
        assert_eq!(schema["properties"]["level"]["enum"], json!([1, 2]));
        assert_eq!(schema["required"], json!(["msg"]));

        assert!(op["responses"]["200"]["content"]["text/plain"].is_object());
    }

    #[test]
    fn test_openapi_doc_is_stable() {
        let registry = registry();
        let first = serde_json::to_string(&openapi_doc(&registry, "mcpd", "0.1.0")).unwrap();
        let second = serde_json::to_string(&openapi_doc(&registry, "mcpd", "0.1.0")).unwrap();
        assert_eq!(first, second);
    }
}
