//! Type descriptors (spec §3, §4 "Type Registry").
//!
//! Descriptors are shared, reference-counted, and immutable once built —
//! `TypeRef` is an `Rc<TypeDescriptor>` and two descriptors denote the same
//! type iff the `Rc`s point at the same allocation (`same_type`), never by
//! structural comparison.

use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeForm {
    Scalar,
    Enum,
    Subrange,
    Array,
    Complex,
    Stream,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeCode {
    Int,
    Char,
    WChar,
    Float,
    Bool,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Void,
    Complex,
    File,
}

#[derive(Debug)]
pub struct ArrayPayload {
    pub index_type: TypeRef,
    pub element_type: TypeRef,
    pub min_index: i64,
    pub max_index: i64,
    pub element_count: usize,
}

#[derive(Debug)]
pub struct EnumPayload {
    pub constants: Vec<Rc<str>>,
    pub max_ordinal: i64,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: Rc<str>,
    pub field_type: TypeRef,
    pub offset: usize,
}

#[derive(Debug)]
pub struct ComplexPayload {
    pub fields: Vec<FieldDescriptor>,
}

impl ComplexPayload {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| &*f.name == name)
    }
}

#[derive(Debug)]
pub struct StreamPayload {
    pub file_name: Rc<str>,
    pub open_mode: Rc<str>,
}

#[derive(Debug)]
pub enum TypePayload {
    None,
    Array(ArrayPayload),
    Enum(EnumPayload),
    Complex(ComplexPayload),
    Stream(StreamPayload),
}

#[derive(Debug)]
pub struct TypeDescriptor {
    pub form: TypeForm,
    pub type_code: TypeCode,
    pub size: usize,
    /// Back-link to a named type in the symbol table, if this descriptor
    /// was bound to one (e.g. `type Point = ...`).
    pub name: Option<Rc<str>>,
    pub payload: TypePayload,
}

pub type TypeRef = Rc<TypeDescriptor>;

/// Two type refs denote the same type iff they share the same allocation.
pub fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// Strips one level of array indirection: the element type for arrays, the
/// descriptor itself otherwise.
pub fn base_type(ty: &TypeRef) -> TypeRef {
    match &ty.payload {
        TypePayload::Array(array) => Rc::clone(&array.element_type),
        _ => Rc::clone(ty),
    }
}

pub fn is_integral(ty: &TypeRef) -> bool {
    matches!(
        ty.type_code,
        TypeCode::Int
            | TypeCode::Char
            | TypeCode::WChar
            | TypeCode::Bool
            | TypeCode::UInt8
            | TypeCode::UInt16
            | TypeCode::UInt32
            | TypeCode::UInt64
    )
}

pub fn is_float(ty: &TypeRef) -> bool {
    ty.type_code == TypeCode::Float
}

pub fn is_char(ty: &TypeRef) -> bool {
    ty.type_code == TypeCode::Char || ty.type_code == TypeCode::WChar
}

/// True for the three forms whose cell holds an address rather than a
/// value directly (spec §3 invariant 2): array, record, stream. Enum and
/// subrange are structurally distinct forms but are still ordinal scalars
/// at the value level, so they are *not* aggregate.
pub fn is_aggregate(form: TypeForm) -> bool {
    matches!(form, TypeForm::Array | TypeForm::Complex | TypeForm::Stream)
}

fn scalar(type_code: TypeCode, size: usize) -> TypeRef {
    Rc::new(TypeDescriptor {
        form: TypeForm::Scalar,
        type_code,
        size,
        name: None,
        payload: TypePayload::None,
    })
}

/// Canonical sentinel descriptors for the builtin types, consulted by
/// identity throughout the evaluator (spec §6 "Type sentinels").
pub struct TypeRegistry {
    pub int_ty: TypeRef,
    pub char_ty: TypeRef,
    pub wchar_ty: TypeRef,
    pub float_ty: TypeRef,
    pub bool_ty: TypeRef,
    pub uint8_ty: TypeRef,
    pub uint16_ty: TypeRef,
    pub uint32_ty: TypeRef,
    pub uint64_ty: TypeRef,
    pub void_ty: TypeRef,
    pub file_ty: TypeRef,
    pub dummy_ty: TypeRef,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry {
            int_ty: scalar(TypeCode::Int, 8),
            char_ty: scalar(TypeCode::Char, 1),
            wchar_ty: scalar(TypeCode::WChar, 2),
            float_ty: scalar(TypeCode::Float, 8),
            bool_ty: scalar(TypeCode::Bool, 1),
            uint8_ty: scalar(TypeCode::UInt8, 1),
            uint16_ty: scalar(TypeCode::UInt16, 2),
            uint32_ty: scalar(TypeCode::UInt32, 4),
            uint64_ty: scalar(TypeCode::UInt64, 8),
            void_ty: scalar(TypeCode::Void, 0),
            file_ty: Rc::new(TypeDescriptor {
                form: TypeForm::Stream,
                type_code: TypeCode::File,
                size: 0,
                name: None,
                payload: TypePayload::Stream(StreamPayload {
                    file_name: Rc::from(""),
                    open_mode: Rc::from(""),
                }),
            }),
            dummy_ty: scalar(TypeCode::Void, 0),
        }
    }

    /// Builds a fresh array descriptor: used both by a hosting interpreter's
    /// declaration processing and by the evaluator's array-literal
    /// construction (spec §4.1.5).
    pub fn make_array(
        &self,
        element_type: TypeRef,
        min_index: i64,
        max_index: i64,
    ) -> TypeRef {
        let element_count = (max_index - min_index + 1).max(0) as usize;
        let size = element_count * element_type.size;
        Rc::new(TypeDescriptor {
            form: TypeForm::Array,
            type_code: TypeCode::Complex,
            size,
            name: None,
            payload: TypePayload::Array(ArrayPayload {
                index_type: Rc::clone(&self.int_ty),
                element_type,
                min_index,
                max_index,
                element_count,
            }),
        })
    }

    pub fn make_record(&self, fields: Vec<FieldDescriptor>) -> TypeRef {
        let size = fields
            .iter()
            .map(|f| f.offset + f.field_type.size)
            .max()
            .unwrap_or(0);
        Rc::new(TypeDescriptor {
            form: TypeForm::Complex,
            type_code: TypeCode::Complex,
            size,
            name: None,
            payload: TypePayload::Complex(ComplexPayload { fields }),
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> TypeRegistry {
        TypeRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_types_are_distinct_by_identity() {
        let reg = TypeRegistry::new();
        assert!(!same_type(&reg.int_ty, &reg.float_ty));
        assert!(same_type(&reg.int_ty, &reg.int_ty));
    }

    #[test]
    fn only_array_complex_and_stream_forms_are_aggregate() {
        assert!(!is_aggregate(TypeForm::Scalar));
        assert!(!is_aggregate(TypeForm::Enum));
        assert!(!is_aggregate(TypeForm::Subrange));
        assert!(is_aggregate(TypeForm::Array));
        assert!(is_aggregate(TypeForm::Complex));
        assert!(is_aggregate(TypeForm::Stream));
    }

    #[test]
    fn base_type_strips_one_array_level() {
        let reg = TypeRegistry::new();
        let array_ty = reg.make_array(Rc::clone(&reg.int_ty), 0, 2);
        assert_eq!(base_type(&array_ty).type_code, TypeCode::Int);
        assert_eq!(base_type(&reg.int_ty).type_code, TypeCode::Int);
    }

    #[test]
    fn array_size_is_element_count_times_element_size() {
        let reg = TypeRegistry::new();
        let array_ty = reg.make_array(Rc::clone(&reg.int_ty), 0, 2);
        assert_eq!(array_ty.size, 3 * reg.int_ty.size);
    }

    #[test]
    fn record_field_lookup() {
        let reg = TypeRegistry::new();
        let fields = vec![
            FieldDescriptor {
                name: Rc::from("x"),
                field_type: Rc::clone(&reg.int_ty),
                offset: 0,
            },
            FieldDescriptor {
                name: Rc::from("y"),
                field_type: Rc::clone(&reg.int_ty),
                offset: 8,
            },
        ];
        let record_ty = reg.make_record(fields);
        match &record_ty.payload {
            TypePayload::Complex(complex) => {
                let y = complex.field("y").expect("y field");
                assert_eq!(y.offset, 8);
            }
            _ => panic!("expected complex payload"),
        }
    }
}
