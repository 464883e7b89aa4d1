//! `NamespaceA` of the namespace fixture schema:
//!
//! ```text
//! table TableInFirstNS {
//!     foo_table: NamespaceB.TableInNestedNS;
//!     foo_enum: NamespaceB.EnumInNestedNS;
//!     foo_struct: NamespaceB.StructInNestedNS;
//! }
//! table TableInC { refer_to_a1: TableInFirstNS; refer_to_a2: SecondTableInA; }
//! table SecondTableInA { refer_to_c: TableInC; }
//! ```

pub mod namespace_b;

use tablebuf::{Builder, FieldIndex, Follow, ForwardsOffset, Offset, Packed, Table};
use tablebuf_common::Result;

use namespace_b::{EnumInNestedNS, StructInNestedNS, TableInNestedNS, TableInNestedNSOffset};

pub enum TableInFirstNSOffset {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInFirstNS<'a> {
    table: Table<'a>,
}

impl<'a> TableInFirstNS<'a> {
    pub const VT_FOO_TABLE: FieldIndex = 0;
    pub const VT_FOO_ENUM: FieldIndex = 1;
    pub const VT_FOO_STRUCT: FieldIndex = 2;
    pub const FIELD_COUNT: usize = 3;

    pub fn init(table: Table<'a>) -> Self {
        TableInFirstNS { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    pub fn foo_table(&self) -> Result<Option<TableInNestedNS<'a>>> {
        self.table
            .get::<ForwardsOffset<TableInNestedNS<'a>>>(Self::VT_FOO_TABLE)
    }

    pub fn foo_enum(&self) -> Result<EnumInNestedNS> {
        self.table
            .get_scalar::<i8>(Self::VT_FOO_ENUM, EnumInNestedNS::A.0)
            .map(EnumInNestedNS)
    }

    pub fn foo_struct(&self) -> Result<Option<StructInNestedNS>> {
        self.table
            .get::<Packed<StructInNestedNS>>(Self::VT_FOO_STRUCT)
    }

    pub fn create(
        builder: &mut Builder,
        args: &TableInFirstNSArgs,
    ) -> Result<Offset<TableInFirstNSOffset>> {
        Self::start(builder)?;
        if let Some(foo_struct) = &args.foo_struct {
            Self::add_foo_struct(builder, foo_struct)?;
        }
        if let Some(foo_table) = args.foo_table {
            Self::add_foo_table(builder, foo_table)?;
        }
        Self::add_foo_enum(builder, args.foo_enum)?;
        Self::end(builder)
    }

    pub fn start(builder: &mut Builder) -> Result<()> {
        builder.start_object(Self::FIELD_COUNT)
    }

    pub fn add_foo_table(
        builder: &mut Builder,
        foo_table: Offset<TableInNestedNSOffset>,
    ) -> Result<()> {
        builder.add_offset(Self::VT_FOO_TABLE, foo_table)
    }

    pub fn add_foo_enum(builder: &mut Builder, foo_enum: EnumInNestedNS) -> Result<()> {
        builder.add_scalar::<i8>(Self::VT_FOO_ENUM, foo_enum.0, EnumInNestedNS::A.0)
    }

    pub fn add_foo_struct(builder: &mut Builder, foo_struct: &StructInNestedNS) -> Result<()> {
        builder.add_struct(Self::VT_FOO_STRUCT, foo_struct)
    }

    pub fn end(builder: &mut Builder) -> Result<Offset<TableInFirstNSOffset>> {
        Ok(builder.end_object()?.cast())
    }
}

impl<'a> Follow<'a> for TableInFirstNS<'a> {
    type Inner = Self;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Self> {
        Ok(Self::init(Table::new(buf, position)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableInFirstNSArgs {
    pub foo_table: Option<Offset<TableInNestedNSOffset>>,
    pub foo_enum: EnumInNestedNS,
    pub foo_struct: Option<StructInNestedNS>,
}

pub enum TableInCOffset {}

/// Table referring to tables of the outer namespace. Both references are
/// optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInC<'a> {
    table: Table<'a>,
}

impl<'a> TableInC<'a> {
    pub const VT_REFER_TO_A1: FieldIndex = 0;
    pub const VT_REFER_TO_A2: FieldIndex = 1;
    pub const FIELD_COUNT: usize = 2;

    pub fn get_root(buf: &'a [u8]) -> Result<TableInC<'a>> {
        tablebuf::root::<TableInC<'a>>(buf)
    }

    pub fn init(table: Table<'a>) -> Self {
        TableInC { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    /// Points this accessor at another `TableInC` of the same buffer.
    pub fn rebind(&mut self, position: usize) {
        self.table.rebind(position);
    }

    pub fn refer_to_a1(&self) -> Result<Option<TableInFirstNS<'a>>> {
        self.table
            .get::<ForwardsOffset<TableInFirstNS<'a>>>(Self::VT_REFER_TO_A1)
    }

    pub fn refer_to_a2(&self) -> Result<Option<SecondTableInA<'a>>> {
        self.table
            .get::<ForwardsOffset<SecondTableInA<'a>>>(Self::VT_REFER_TO_A2)
    }

    pub fn create(builder: &mut Builder, args: &TableInCArgs) -> Result<Offset<TableInCOffset>> {
        Self::start(builder)?;
        if let Some(refer_to_a2) = args.refer_to_a2 {
            Self::add_refer_to_a2(builder, refer_to_a2)?;
        }
        if let Some(refer_to_a1) = args.refer_to_a1 {
            Self::add_refer_to_a1(builder, refer_to_a1)?;
        }
        Self::end(builder)
    }

    pub fn start(builder: &mut Builder) -> Result<()> {
        builder.start_object(Self::FIELD_COUNT)
    }

    pub fn add_refer_to_a1(
        builder: &mut Builder,
        refer_to_a1: Offset<TableInFirstNSOffset>,
    ) -> Result<()> {
        builder.add_offset(Self::VT_REFER_TO_A1, refer_to_a1)
    }

    pub fn add_refer_to_a2(
        builder: &mut Builder,
        refer_to_a2: Offset<SecondTableInAOffset>,
    ) -> Result<()> {
        builder.add_offset(Self::VT_REFER_TO_A2, refer_to_a2)
    }

    pub fn end(builder: &mut Builder) -> Result<Offset<TableInCOffset>> {
        Ok(builder.end_object()?.cast())
    }

    pub fn finish_buffer(
        builder: &mut Builder,
        root: Offset<TableInCOffset>,
        file_identifier: Option<&str>,
    ) -> Result<()> {
        builder.finish(root, file_identifier)
    }
}

impl<'a> Follow<'a> for TableInC<'a> {
    type Inner = Self;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Self> {
        Ok(Self::init(Table::new(buf, position)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableInCArgs {
    pub refer_to_a1: Option<Offset<TableInFirstNSOffset>>,
    pub refer_to_a2: Option<Offset<SecondTableInAOffset>>,
}

pub enum SecondTableInAOffset {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondTableInA<'a> {
    table: Table<'a>,
}

impl<'a> SecondTableInA<'a> {
    pub const VT_REFER_TO_C: FieldIndex = 0;
    pub const FIELD_COUNT: usize = 1;

    pub fn init(table: Table<'a>) -> Self {
        SecondTableInA { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    pub fn refer_to_c(&self) -> Result<Option<TableInC<'a>>> {
        self.table
            .get::<ForwardsOffset<TableInC<'a>>>(Self::VT_REFER_TO_C)
    }

    pub fn create(
        builder: &mut Builder,
        args: &SecondTableInAArgs,
    ) -> Result<Offset<SecondTableInAOffset>> {
        Self::start(builder)?;
        if let Some(refer_to_c) = args.refer_to_c {
            Self::add_refer_to_c(builder, refer_to_c)?;
        }
        Self::end(builder)
    }

    pub fn start(builder: &mut Builder) -> Result<()> {
        builder.start_object(Self::FIELD_COUNT)
    }

    pub fn add_refer_to_c(builder: &mut Builder, refer_to_c: Offset<TableInCOffset>) -> Result<()> {
        builder.add_offset(Self::VT_REFER_TO_C, refer_to_c)
    }

    pub fn end(builder: &mut Builder) -> Result<Offset<SecondTableInAOffset>> {
        Ok(builder.end_object()?.cast())
    }
}

impl<'a> Follow<'a> for SecondTableInA<'a> {
    type Inner = Self;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Self> {
        Ok(Self::init(Table::new(buf, position)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecondTableInAArgs {
    pub refer_to_c: Option<Offset<TableInCOffset>>,
}

/// Builds the fixture buffer: a root `TableInC` with `refer_to_a1` absent and
/// `refer_to_a2` pointing at a `SecondTableInA` that refers to a child
/// `TableInC` whose `refer_to_a1` carries `foo` and `foo_struct`.
pub fn build_table_in_c(
    builder: &mut Builder,
    foo: i32,
    file_identifier: Option<&str>,
) -> Result<()> {
    let nested = TableInNestedNS::create(builder, &namespace_b::TableInNestedNSArgs { foo })?;
    let first = TableInFirstNS::create(
        builder,
        &TableInFirstNSArgs {
            foo_table: Some(nested),
            foo_enum: EnumInNestedNS::C,
            foo_struct: Some(StructInNestedNS::new(foo, -foo)),
        },
    )?;
    let child = TableInC::create(
        builder,
        &TableInCArgs {
            refer_to_a1: Some(first),
            refer_to_a2: None,
        },
    )?;
    let second = SecondTableInA::create(
        builder,
        &SecondTableInAArgs {
            refer_to_c: Some(child),
        },
    )?;
    let root = TableInC::create(
        builder,
        &TableInCArgs {
            refer_to_a1: None,
            refer_to_a2: Some(second),
        },
    )?;
    TableInC::finish_buffer(builder, root, file_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_in_c_round_trip() {
        let mut builder = Builder::new();
        build_table_in_c(&mut builder, 17, None).unwrap();
        let data = builder.finished_data().unwrap();

        let root = TableInC::get_root(data).unwrap();
        assert!(root.refer_to_a1().unwrap().is_none());
        let child = root
            .refer_to_a2()
            .unwrap()
            .unwrap()
            .refer_to_c()
            .unwrap()
            .unwrap();
        assert!(child.refer_to_a2().unwrap().is_none());
        let first = child.refer_to_a1().unwrap().unwrap();
        assert_eq!(first.foo_enum().unwrap(), EnumInNestedNS::C);
        assert_eq!(first.foo_table().unwrap().unwrap().foo().unwrap(), 17);
        let s = first.foo_struct().unwrap().unwrap();
        assert_eq!((s.a(), s.b()), (17, -17));
    }

    #[test]
    fn test_accessor_rebind() {
        let mut builder = Builder::new();
        build_table_in_c(&mut builder, 1, None).unwrap();
        let data = builder.finished_data().unwrap();

        let mut view = TableInC::get_root(data).unwrap();
        let child = view
            .refer_to_a2()
            .unwrap()
            .unwrap()
            .refer_to_c()
            .unwrap()
            .unwrap();
        view.rebind(child.table().position());
        assert_eq!(view, child);
        assert!(view.refer_to_a1().unwrap().is_some());
    }

    #[test]
    fn test_default_enum_is_omitted() {
        let mut builder = Builder::new();
        let table = TableInFirstNS::create(&mut builder, &TableInFirstNSArgs::default()).unwrap();
        builder.finish(table, None).unwrap();
        let first = tablebuf::root::<TableInFirstNS>(builder.finished_data().unwrap()).unwrap();
        assert_eq!(first.foo_enum().unwrap(), EnumInNestedNS::A);
        assert!(!first.table().has_field(TableInFirstNS::VT_FOO_ENUM).unwrap());
        assert!(first.foo_table().unwrap().is_none());
        assert!(first.foo_struct().unwrap().is_none());
    }
}
