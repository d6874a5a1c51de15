use super::*;

#[test]
fn describe_formats_bool_backed_by_an_int_cell() {
    let registry = TypeRegistry::new();
    let out = describe(&Cell::Int(1), &registry.bool_ty);
    assert_eq!(out, "true");
}

#[test]
fn describe_formats_plain_int_and_float_cells() {
    let registry = TypeRegistry::new();
    assert_eq!(describe(&Cell::Int(42), &registry.int_ty), "42");
    assert_eq!(describe(&Cell::Float(2.5), &registry.float_ty), "2.5");
}

#[test]
fn describe_formats_char_cells_with_quotes() {
    let registry = TypeRegistry::new();
    assert_eq!(describe(&Cell::Char('x'), &registry.char_ty), "'x'");
}
