//! Test discovery types and main entry point.
//!
//! A test is a top-level function carrying a `@test(...)` decorator:
//!
//! ```python
//! @test("adding fruit to the basket", tags=["fruit", "slow"])
//! def _():
//!     ...
//! ```
//!
//! The first positional string passed to the decorator becomes the test's
//! description and the `tags=[...]` keyword its tags. Modules are parsed
//! with tree-sitter; nothing is imported or executed.

use crate::collection::error::{CollectionError, CollectionResult};
use crate::collection::types::{get_module_path, Location, ModuleDescriptor, Test, TestFunction};
use crate::collection_integration::ModuleImporter;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Finds `@test`-decorated functions in Python source.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestDiscovery;

impl TestDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// Find every test defined in `source`, the text of module `module_name`
    /// read from `path`.
    pub fn discover(
        &self,
        path: &Path,
        source: &str,
        module_name: &str,
    ) -> CollectionResult<Vec<Test>> {
        let tree = parse_python(path, source)?;
        let root = tree.root_node();

        let mut cursor = root.walk();
        let tests = root
            .children(&mut cursor)
            .filter(|node| node.kind() == "decorated_definition")
            .filter_map(|node| test_from_definition(node, path, source, module_name))
            .collect();

        Ok(tests)
    }
}

fn parse_python(path: &Path, source: &str) -> CollectionResult<Tree> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|e| {
        CollectionError::ImportError(format!("failed to load the Python grammar: {e}"))
    })?;

    parser
        .parse(source, None)
        .ok_or_else(|| CollectionError::ImportError(format!("failed to parse {}", path.display())))
}

/// Build a test from a top-level decorated function, if one of its
/// decorators is `@test`.
fn test_from_definition(
    node: Node<'_>,
    path: &Path,
    source: &str,
    module_name: &str,
) -> Option<Test> {
    let function = node
        .child_by_field_name("definition")
        .filter(|definition| definition.kind() == "function_definition")?;

    let mut cursor = node.walk();
    let decorator = node
        .children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .find_map(|child| TestDecorator::from_node(child, source))?;

    let name = node_text(function.child_by_field_name("name")?, source);

    let mut test = Test::new(TestFunction::new(name, node_text(node, source)), module_name)
        .with_tags(decorator.tags(source))
        .with_location(Location {
            path: path.to_path_buf(),
            line: Some(function.start_position().row + 1),
        });
    if let Some(description) = decorator.description(source) {
        test = test.with_description(description);
    }

    Some(test)
}

/// A `@test` or `@<module>.test` decorator, with its argument list when
/// called.
#[derive(Debug, Clone, Copy)]
struct TestDecorator<'t> {
    arguments: Option<Node<'t>>,
}

impl<'t> TestDecorator<'t> {
    fn from_node(decorator: Node<'t>, source: &str) -> Option<Self> {
        let mut cursor = decorator.walk();
        let expression = decorator.named_children(&mut cursor).next()?;

        if expression.kind() == "call" {
            let callee = expression.child_by_field_name("function")?;
            let arguments = expression
                .child_by_field_name("arguments")
                .filter(|args| args.kind() == "argument_list");
            return is_test_callee(callee, source).then_some(Self { arguments });
        }

        is_test_callee(expression, source).then_some(Self { arguments: None })
    }

    fn description(&self, source: &str) -> Option<String> {
        let arguments = self.arguments?;
        let mut cursor = arguments.walk();
        let first = arguments
            .named_children(&mut cursor)
            .find(|arg| arg.kind() != "comment")?;
        string_value(first, source)
    }

    fn tags(&self, source: &str) -> Vec<String> {
        let Some(arguments) = self.arguments else {
            return Vec::new();
        };

        let mut cursor = arguments.walk();
        let Some(value) = arguments
            .named_children(&mut cursor)
            .filter(|arg| arg.kind() == "keyword_argument")
            .find(|arg| {
                arg.child_by_field_name("name")
                    .is_some_and(|name| node_text(name, source) == "tags")
            })
            .and_then(|arg| arg.child_by_field_name("value"))
        else {
            return Vec::new();
        };

        let mut cursor = value.walk();
        value
            .named_children(&mut cursor)
            .filter_map(|element| string_value(element, source))
            .collect()
    }
}

fn is_test_callee(node: Node<'_>, source: &str) -> bool {
    match node.kind() {
        "identifier" => node_text(node, source) == "test",
        "attribute" => node
            .child_by_field_name("attribute")
            .is_some_and(|attr| node_text(attr, source) == "test"),
        _ => false,
    }
}

/// Contents of a plain string literal, without prefix or quotes.
fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut cursor = node.walk();
    let value = node
        .children(&mut cursor)
        .filter(|child| child.kind() == "string_content")
        .map(|child| node_text(child, source))
        .collect();
    Some(value)
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Parse a Python file and discover test functions
pub fn discover_tests(path: &Path, source: &str, module_name: &str) -> CollectionResult<Vec<Test>> {
    TestDiscovery::new().discover(path, source, module_name)
}

/// Importer that reads test modules from disk and discovers their tests
/// statically.
#[derive(Debug, Default)]
pub struct SourceImporter {
    discovery: TestDiscovery,
}

impl SourceImporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleImporter for SourceImporter {
    fn import_tests(&self, module: &ModuleDescriptor) -> CollectionResult<Vec<Test>> {
        let path = get_module_path(module)?;
        let source = std::fs::read_to_string(&path)?;
        self.discovery.discover(&path, &source, module.name())
    }
}
