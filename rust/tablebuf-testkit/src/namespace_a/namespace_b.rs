//! `NamespaceA.NamespaceB`: a table, an enum and a struct used from the outer
//! namespace.

use tablebuf::{Builder, FieldIndex, Follow, Offset, Struct, Table};
use tablebuf_common::Result;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct EnumInNestedNS(pub i8);

impl EnumInNestedNS {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);

    pub const ENUM_VALUES: &'static [Self] = &[Self::A, Self::B, Self::C];

    pub fn variant_name(self) -> Option<&'static str> {
        match self {
            Self::A => Some("A"),
            Self::B => Some("B"),
            Self::C => Some("C"),
            _ => None,
        }
    }
}

impl std::fmt::Debug for EnumInNestedNS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "<UNKNOWN {}>", self.0),
        }
    }
}

/// `struct StructInNestedNS { a: int; b: int; }`
#[derive(Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct StructInNestedNS([u8; 8]);

impl StructInNestedNS {
    pub fn new(a: i32, b: i32) -> StructInNestedNS {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(&a.to_le_bytes());
        bytes[4..8].copy_from_slice(&b.to_le_bytes());
        StructInNestedNS(bytes)
    }

    pub fn a(&self) -> i32 {
        i32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn b(&self) -> i32 {
        i32::from_le_bytes([self.0[4], self.0[5], self.0[6], self.0[7]])
    }
}

impl Struct for StructInNestedNS {
    const ALIGNMENT: usize = 4;
}

impl std::fmt::Debug for StructInNestedNS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructInNestedNS")
            .field("a", &self.a())
            .field("b", &self.b())
            .finish()
    }
}

pub enum TableInNestedNSOffset {}

/// `table TableInNestedNS { foo: int; }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInNestedNS<'a> {
    table: Table<'a>,
}

impl<'a> TableInNestedNS<'a> {
    pub const VT_FOO: FieldIndex = 0;
    pub const FIELD_COUNT: usize = 1;

    pub fn init(table: Table<'a>) -> Self {
        TableInNestedNS { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    pub fn foo(&self) -> Result<i32> {
        self.table.get_scalar::<i32>(Self::VT_FOO, 0)
    }

    pub fn create(
        builder: &mut Builder,
        args: &TableInNestedNSArgs,
    ) -> Result<Offset<TableInNestedNSOffset>> {
        Self::start(builder)?;
        Self::add_foo(builder, args.foo)?;
        Self::end(builder)
    }

    pub fn start(builder: &mut Builder) -> Result<()> {
        builder.start_object(Self::FIELD_COUNT)
    }

    pub fn add_foo(builder: &mut Builder, foo: i32) -> Result<()> {
        builder.add_scalar::<i32>(Self::VT_FOO, foo, 0)
    }

    pub fn end(builder: &mut Builder) -> Result<Offset<TableInNestedNSOffset>> {
        Ok(builder.end_object()?.cast())
    }
}

impl<'a> Follow<'a> for TableInNestedNS<'a> {
    type Inner = Self;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Self> {
        Ok(Self::init(Table::new(buf, position)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableInNestedNSArgs {
    pub foo: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_fields() {
        let s = StructInNestedNS::new(-1, 1 << 20);
        assert_eq!(s.a(), -1);
        assert_eq!(s.b(), 1 << 20);
        assert_eq!(bytemuck::bytes_of(&s)[0..4], [0xFF; 4]);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(EnumInNestedNS::B.variant_name(), Some("B"));
        assert_eq!(format!("{:?}", EnumInNestedNS(7)), "<UNKNOWN 7>");
        assert_eq!(EnumInNestedNS::default(), EnumInNestedNS::A);
    }
}
