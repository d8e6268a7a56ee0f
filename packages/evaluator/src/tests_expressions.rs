/// Expression semantics observed through rendered documents
use crate::*;
use livemark_parser::parse;

fn evaluate(source: &str) -> EvalResult<DocumentTree> {
    let doc = parse(source).unwrap();
    let module = compile_module(&doc, source).unwrap();
    instantiate(
        &module,
        &ComponentRegistry::with_builtins().snapshot(),
        UnknownTagFallback::Label,
    )
}

fn rendered_text(source: &str) -> String {
    evaluate(source)
        .unwrap()
        .nodes
        .iter()
        .map(VNode::text_content)
        .collect()
}

fn error_message(source: &str) -> String {
    evaluate(source).unwrap_err().to_string()
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(rendered_text("{1 + 2 * 3}"), "7");
    assert_eq!(rendered_text("{(1 + 2) * 3}"), "9");
    assert_eq!(rendered_text("{10 / 4}"), "2.5");
    assert_eq!(rendered_text("{7 % 3}"), "1");
    assert_eq!(rendered_text("{-2 + 5}"), "3");
}

#[test]
fn test_string_concatenation() {
    assert_eq!(rendered_text("{'a' + 1}"), "a1");
    assert_eq!(rendered_text("{1 + '2'}"), "12");
    assert_eq!(rendered_text("{\"x\" + true}"), "xtrue");
}

#[test]
fn test_division_by_zero() {
    assert_eq!(rendered_text("{1 / 0}"), "Infinity");
    assert_eq!(rendered_text("{0 / 0}"), "NaN");
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(rendered_text("{String(3 > 2)}"), "true");
    assert_eq!(rendered_text("{String('a' < 'b')}"), "true");
    assert_eq!(rendered_text("{String(1 == '1')}"), "true");
    assert_eq!(rendered_text("{String(1 === '1')}"), "false");
    assert_eq!(rendered_text("{String(null == undefined)}"), "true");
    assert_eq!(rendered_text("{String(null === undefined)}"), "false");
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(rendered_text("{0 || 'fallback'}"), "fallback");
    assert_eq!(rendered_text("{'set' && 'value'}"), "value");
    assert_eq!(rendered_text("{null ?? 'default'}"), "default");
    assert_eq!(rendered_text("{0 ?? 'default'}"), "0");
}

#[test]
fn test_conditional() {
    assert_eq!(rendered_text("{true ? 'yes' : 'no'}"), "yes");
    assert_eq!(rendered_text("{'' ? 'yes' : 'no'}"), "no");
}

#[test]
fn test_booleans_and_nullish_render_nothing() {
    let tree = evaluate("{false}\n\n{null}\n\n{undefined}\n\n{''}").unwrap();
    assert!(tree.is_empty());
}

#[test]
fn test_arrays_render_each_item() {
    let tree = evaluate("{[1, [2, 'three'], null]}").unwrap();
    assert_eq!(tree.nodes.len(), 3);
    assert_eq!(rendered_text("{[1, [2, 'three'], null]}"), "12three");
}

#[test]
fn test_exports_are_in_scope() {
    let source = "export const product = 'Livemark'\nexport const version = 2\n\n{product} v{version}";
    assert_eq!(rendered_text(source), "Livemark v2");
}

#[test]
fn test_exports_can_reference_earlier_exports() {
    let source = "export const base = 40\n\nexport const answer = base + 2\n\n{answer}";
    assert_eq!(rendered_text(source), "42");
}

#[test]
fn test_member_and_index_access() {
    let source = "export const site = { name: 'Docs', tags: ['a', 'b'] }\n\n{site.name} {site.tags[1]} {site.tags.length}";
    assert_eq!(rendered_text(source), "Docs b 2");
}

#[test]
fn test_missing_property_is_undefined() {
    let source = "export const site = { name: 'Docs' }\n\n{site.missing}";
    assert!(evaluate(source).unwrap().is_empty());
}

#[test]
fn test_template_literal() {
    let source = "export const name = 'World'\n\n{`Hello, ${name}!`}";
    assert_eq!(rendered_text(source), "Hello, World!");
}

#[test]
fn test_string_methods() {
    assert_eq!(rendered_text("{'hello'.toUpperCase()}"), "HELLO");
    assert_eq!(rendered_text("{'  pad  '.trim()}"), "pad");
    assert_eq!(rendered_text("{'a-b-c'.split('-').join('+')}"), "a+b+c");
    assert_eq!(rendered_text("{'livemark'.slice(0, 4)}"), "live");
    assert_eq!(rendered_text("{'livemark'.slice(-4)}"), "mark");
    assert_eq!(rendered_text("{'7'.padStart(3, '0')}"), "007");
    assert_eq!(rendered_text("{String('docs'.includes('oc'))}"), "true");
}

#[test]
fn test_array_methods() {
    assert_eq!(rendered_text("{[1, 2, 3].join(', ')}"), "1, 2, 3");
    assert_eq!(rendered_text("{[1, 2, 3].indexOf(2)}"), "1");
    assert_eq!(rendered_text("{[1, 2, 3].at(-1)}"), "3");
    assert_eq!(rendered_text("{[3, 4].concat([5]).length}"), "3");
}

#[test]
fn test_globals() {
    assert_eq!(rendered_text("{Math.max(1, 5, 3)}"), "5");
    assert_eq!(rendered_text("{Math.round(2.5)}"), "3");
    assert_eq!(rendered_text("{Math.floor(Math.PI)}"), "3");
    assert_eq!(rendered_text("{Number('42') + 1}"), "43");
    assert_eq!(rendered_text("{JSON.stringify({ a: 1 })}"), "{\"a\":1}");
    assert_eq!(rendered_text("{typeof missing}"), "undefined");
    assert_eq!(rendered_text("{typeof 1}"), "number");
}

#[test]
fn test_to_fixed() {
    let source = "export const pi = 3.14159\n\n{pi.toFixed(2)}";
    assert_eq!(rendered_text(source), "3.14");
    assert_eq!(
        error_message("export const pi = 3.14159\n\n{pi.toFixed(101)}"),
        "toFixed() digits argument must be between 0 and 100"
    );
}

#[test]
fn test_string_growth_is_capped() {
    assert_eq!(error_message("{\"x\".repeat(1e12)}"), "Invalid string length");
    assert_eq!(error_message("{'ab'.repeat(-1)}"), "Invalid count value: -1");
    assert_eq!(error_message("{'ab'.repeat(1 / 0)}"), "Invalid count value: Infinity");
    assert_eq!(error_message("{'7'.padStart(1e12, '0')}"), "Invalid string length");
    assert_eq!(error_message("{'7'.padEnd(1e15)}"), "Invalid string length");

    let doubling = "export const a = 'x'.repeat(1e6)\nexport const b = a + a\n\n{b.length}";
    assert_eq!(error_message(doubling), "Invalid string length");
    let joined = "export const a = 'x'.repeat(6e5)\n\n{[a, a].join('')}";
    assert_eq!(error_message(joined), "Invalid string length");

    assert_eq!(rendered_text("{'ab'.repeat(3)}"), "ababab");
    assert_eq!(rendered_text("{'ab'.repeat(0)}"), "");
    assert_eq!(rendered_text("{'x'.repeat(1e5).length}"), "100000");
}

#[test]
fn test_large_numbers_use_exponent_form() {
    assert_eq!(rendered_text("{900719925465092000000000000}"), "9.00719925465092e+26");
    assert_eq!(rendered_text("{1e21}"), "1e+21");
    assert_eq!(rendered_text("{0.0000001}"), "1e-7");
    assert_eq!(rendered_text("{0.000001}"), "0.000001");
}

#[test]
fn test_undefined_variable() {
    assert_eq!(error_message("Hello {missing}"), "missing is not defined");
}

#[test]
fn test_property_of_null() {
    let source = "export const user = null\n\n{user.name}";
    assert_eq!(
        error_message(source),
        "Cannot read properties of null (reading 'name')"
    );
}

#[test]
fn test_method_of_undefined() {
    let source = "export const user = {}\n\n{user.name.toUpperCase()}";
    assert_eq!(
        error_message(source),
        "Cannot read properties of undefined (reading 'toUpperCase')"
    );
}

#[test]
fn test_calling_a_non_function() {
    let source = "export const title = 'x'\n\n{title.shout()}";
    assert_eq!(error_message(source), "title.shout is not a function");
    assert_eq!(
        error_message("export const count = 1\n\n{count()}"),
        "count is not a function"
    );
}

#[test]
fn test_unknown_global_function() {
    assert_eq!(error_message("{fetchData()}"), "fetchData is not defined");
}

#[test]
fn test_object_child_is_rejected() {
    assert_eq!(
        error_message("{ {b: 2, a: 1} }"),
        "Objects are not valid as a child (found: object with keys {a, b})"
    );
}

#[test]
fn test_error_span_points_at_expression() {
    let source = "Intro\n\n{missing}";
    let err = evaluate(source).unwrap_err();
    assert_eq!(&source[err.span().start..err.span().end], "missing");
}
