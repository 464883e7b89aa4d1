//! A richer fixture table touching every field kind the engine supports:
//!
//! ```text
//! union Payload { TableInFirstNS, SecondTableInA }
//!
//! table Sample {
//!     name: string (required);
//!     id: uint;
//!     ratio: double = 1.5;
//!     enabled: bool = true;
//!     kind: NamespaceB.EnumInNestedNS = B;
//!     tags: [string];
//!     scores: [short];
//!     origin: NamespaceB.StructInNestedNS;
//!     payload: Payload;
//!     raw: [ubyte];
//!     points: [NamespaceB.StructInNestedNS];
//! }
//!
//! root_type Sample;
//! file_identifier "TBSM";
//! ```

use tablebuf::{
    Builder, FieldIndex, Follow, ForwardsOffset, Offset, Packed, Table, Vector,
    buffer_has_identifier,
};
use tablebuf_common::Result;

use crate::namespace_a::{
    SecondTableInA, SecondTableInAOffset, TableInFirstNS, TableInFirstNSOffset,
    namespace_b::{EnumInNestedNS, StructInNestedNS},
};

pub const SAMPLE_IDENTIFIER: &str = "TBSM";

/// Discriminant of the `Payload` union.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Payload(pub u8);

impl Payload {
    pub const NONE: Self = Self(0);
    pub const TABLE_IN_FIRST_NS: Self = Self(1);
    pub const SECOND_TABLE_IN_A: Self = Self(2);
}

/// Union value to be written into a `Sample`.
#[derive(Debug, Clone, Copy)]
pub enum PayloadValue {
    TableInFirstNS(Offset<TableInFirstNSOffset>),
    SecondTableInA(Offset<SecondTableInAOffset>),
}

impl PayloadValue {
    pub fn payload_type(&self) -> Payload {
        match self {
            PayloadValue::TableInFirstNS(_) => Payload::TABLE_IN_FIRST_NS,
            PayloadValue::SecondTableInA(_) => Payload::SECOND_TABLE_IN_A,
        }
    }
}

pub enum SampleOffset {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<'a> {
    table: Table<'a>,
}

impl<'a> Sample<'a> {
    pub const VT_NAME: FieldIndex = 0;
    pub const VT_ID: FieldIndex = 1;
    pub const VT_RATIO: FieldIndex = 2;
    pub const VT_ENABLED: FieldIndex = 3;
    pub const VT_KIND: FieldIndex = 4;
    pub const VT_TAGS: FieldIndex = 5;
    pub const VT_SCORES: FieldIndex = 6;
    pub const VT_ORIGIN: FieldIndex = 7;
    pub const VT_PAYLOAD_TYPE: FieldIndex = 8;
    pub const VT_PAYLOAD: FieldIndex = 9;
    pub const VT_RAW: FieldIndex = 10;
    pub const VT_POINTS: FieldIndex = 11;
    pub const FIELD_COUNT: usize = 12;

    pub const DEFAULT_RATIO: f64 = 1.5;
    pub const DEFAULT_ENABLED: bool = true;
    pub const DEFAULT_KIND: EnumInNestedNS = EnumInNestedNS::B;

    pub fn get_root(buf: &'a [u8]) -> Result<Sample<'a>> {
        tablebuf::root::<Sample<'a>>(buf)
    }

    pub fn buffer_has_identifier(buf: &[u8]) -> bool {
        buffer_has_identifier(buf, SAMPLE_IDENTIFIER)
    }

    pub fn init(table: Table<'a>) -> Self {
        Sample { table }
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }

    /// Required; a missing name is reported as `None` only for buffers that
    /// were not produced by [`Sample::end`].
    pub fn name(&self) -> Result<Option<&'a str>> {
        self.table.get_str(Self::VT_NAME)
    }

    pub fn id(&self) -> Result<u32> {
        self.table.get_scalar::<u32>(Self::VT_ID, 0)
    }

    pub fn ratio(&self) -> Result<f64> {
        self.table
            .get_scalar::<f64>(Self::VT_RATIO, Self::DEFAULT_RATIO)
    }

    pub fn enabled(&self) -> Result<bool> {
        self.table
            .get_scalar::<bool>(Self::VT_ENABLED, Self::DEFAULT_ENABLED)
    }

    pub fn kind(&self) -> Result<EnumInNestedNS> {
        self.table
            .get_scalar::<i8>(Self::VT_KIND, Self::DEFAULT_KIND.0)
            .map(EnumInNestedNS)
    }

    pub fn tags(&self) -> Result<Option<Vector<'a, ForwardsOffset<&'a str>>>> {
        self.table.get_vector(Self::VT_TAGS)
    }

    pub fn scores(&self) -> Result<Option<Vector<'a, i16>>> {
        self.table.get_vector(Self::VT_SCORES)
    }

    pub fn origin(&self) -> Result<Option<StructInNestedNS>> {
        self.table.get_struct(Self::VT_ORIGIN)
    }

    pub fn payload_type(&self) -> Result<Payload> {
        self.table
            .get_scalar::<u8>(Self::VT_PAYLOAD_TYPE, Payload::NONE.0)
            .map(Payload)
    }

    pub fn payload_as_table_in_first_ns(&self) -> Result<Option<TableInFirstNS<'a>>> {
        self.payload_as(Payload::TABLE_IN_FIRST_NS)
    }

    pub fn payload_as_second_table_in_a(&self) -> Result<Option<SecondTableInA<'a>>> {
        self.payload_as(Payload::SECOND_TABLE_IN_A)
    }

    fn payload_as<T: Follow<'a, Inner = T>>(&self, expected: Payload) -> Result<Option<T>> {
        match self.table.get_union(Self::VT_PAYLOAD_TYPE, Self::VT_PAYLOAD)? {
            Some((kind, table)) if kind == expected.0 => {
                T::follow(table.buf(), table.position()).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn raw(&self) -> Result<Option<&'a [u8]>> {
        Ok(self
            .table
            .get_vector::<u8>(Self::VT_RAW)?
            .map(|raw| raw.bytes()))
    }

    pub fn points(&self) -> Result<Option<Vector<'a, Packed<StructInNestedNS>>>> {
        self.table.get_vector(Self::VT_POINTS)
    }

    pub fn create(builder: &mut Builder, args: &SampleArgs) -> Result<Offset<SampleOffset>> {
        Self::start(builder)?;
        // Largest fields first.
        Self::add_ratio(builder, args.ratio)?;
        if let Some(origin) = &args.origin {
            Self::add_origin(builder, origin)?;
        }
        if let Some(payload) = args.payload {
            Self::add_payload(builder, payload)?;
        }
        if let Some(points) = args.points {
            Self::add_points(builder, points)?;
        }
        if let Some(raw) = args.raw {
            Self::add_raw(builder, raw)?;
        }
        if let Some(scores) = args.scores {
            Self::add_scores(builder, scores)?;
        }
        if let Some(tags) = args.tags {
            Self::add_tags(builder, tags)?;
        }
        Self::add_id(builder, args.id)?;
        if let Some(name) = args.name {
            Self::add_name(builder, name)?;
        }
        Self::add_kind(builder, args.kind)?;
        Self::add_enabled(builder, args.enabled)?;
        Self::end(builder)
    }

    pub fn start(builder: &mut Builder) -> Result<()> {
        builder.start_object(Self::FIELD_COUNT)
    }

    pub fn add_name(builder: &mut Builder, name: Offset<str>) -> Result<()> {
        builder.add_offset(Self::VT_NAME, name)
    }

    pub fn add_id(builder: &mut Builder, id: u32) -> Result<()> {
        builder.add_scalar::<u32>(Self::VT_ID, id, 0)
    }

    pub fn add_ratio(builder: &mut Builder, ratio: f64) -> Result<()> {
        builder.add_scalar::<f64>(Self::VT_RATIO, ratio, Self::DEFAULT_RATIO)
    }

    pub fn add_enabled(builder: &mut Builder, enabled: bool) -> Result<()> {
        builder.add_scalar::<bool>(Self::VT_ENABLED, enabled, Self::DEFAULT_ENABLED)
    }

    pub fn add_kind(builder: &mut Builder, kind: EnumInNestedNS) -> Result<()> {
        builder.add_scalar::<i8>(Self::VT_KIND, kind.0, Self::DEFAULT_KIND.0)
    }

    pub fn add_tags(builder: &mut Builder, tags: Offset<[Offset<str>]>) -> Result<()> {
        builder.add_offset(Self::VT_TAGS, tags)
    }

    pub fn add_scores(builder: &mut Builder, scores: Offset<[i16]>) -> Result<()> {
        builder.add_offset(Self::VT_SCORES, scores)
    }

    pub fn add_origin(builder: &mut Builder, origin: &StructInNestedNS) -> Result<()> {
        builder.add_struct(Self::VT_ORIGIN, origin)
    }

    pub fn add_payload(builder: &mut Builder, payload: PayloadValue) -> Result<()> {
        builder.add_scalar::<u8>(Self::VT_PAYLOAD_TYPE, payload.payload_type().0, 0)?;
        match payload {
            PayloadValue::TableInFirstNS(offset) => builder.add_offset(Self::VT_PAYLOAD, offset),
            PayloadValue::SecondTableInA(offset) => builder.add_offset(Self::VT_PAYLOAD, offset),
        }
    }

    pub fn add_raw(builder: &mut Builder, raw: Offset<[u8]>) -> Result<()> {
        builder.add_offset(Self::VT_RAW, raw)
    }

    pub fn add_points(builder: &mut Builder, points: Offset<[StructInNestedNS]>) -> Result<()> {
        builder.add_offset(Self::VT_POINTS, points)
    }

    pub fn end(builder: &mut Builder) -> Result<Offset<SampleOffset>> {
        let table = builder.end_object()?;
        builder.required(table, Self::VT_NAME)?;
        Ok(table.cast())
    }

    pub fn finish_buffer(builder: &mut Builder, root: Offset<SampleOffset>) -> Result<()> {
        builder.finish(root, Some(SAMPLE_IDENTIFIER))
    }
}

impl<'a> Follow<'a> for Sample<'a> {
    type Inner = Self;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Self> {
        Ok(Self::init(Table::new(buf, position)))
    }
}

#[derive(Debug, Clone)]
pub struct SampleArgs {
    pub name: Option<Offset<str>>,
    pub id: u32,
    pub ratio: f64,
    pub enabled: bool,
    pub kind: EnumInNestedNS,
    pub tags: Option<Offset<[Offset<str>]>>,
    pub scores: Option<Offset<[i16]>>,
    pub origin: Option<StructInNestedNS>,
    pub payload: Option<PayloadValue>,
    pub raw: Option<Offset<[u8]>>,
    pub points: Option<Offset<[StructInNestedNS]>>,
}

impl Default for SampleArgs {
    fn default() -> Self {
        SampleArgs {
            name: None,
            id: 0,
            ratio: Sample::DEFAULT_RATIO,
            enabled: Sample::DEFAULT_ENABLED,
            kind: Sample::DEFAULT_KIND,
            tags: None,
            scores: None,
            origin: None,
            payload: None,
            raw: None,
            points: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_read_back() {
        let mut builder = Builder::new();
        let name = builder.create_string("s").unwrap();
        let root = Sample::create(
            &mut builder,
            &SampleArgs {
                name: Some(name),
                ..Default::default()
            },
        )
        .unwrap();
        Sample::finish_buffer(&mut builder, root).unwrap();

        let data = builder.finished_data().unwrap();
        assert!(Sample::buffer_has_identifier(data));
        let sample = Sample::get_root(data).unwrap();
        assert_eq!(sample.name().unwrap(), Some("s"));
        assert_eq!(sample.id().unwrap(), 0);
        assert_eq!(sample.ratio().unwrap(), 1.5);
        assert!(sample.enabled().unwrap());
        assert_eq!(sample.kind().unwrap(), EnumInNestedNS::B);
        assert_eq!(sample.payload_type().unwrap(), Payload::NONE);
        assert!(sample.payload_as_table_in_first_ns().unwrap().is_none());
        assert!(sample.tags().unwrap().is_none());
        assert!(sample.raw().unwrap().is_none());
        // Only the name slot is stored.
        assert_eq!(sample.table().vtable().unwrap().field_count(), 1);
    }

    #[test]
    fn test_missing_required_name() {
        let mut builder = Builder::new();
        let err = Sample::create(&mut builder, &SampleArgs::default()).unwrap_err();
        assert!(err.is_invalid_state());
    }
}
