//! Random `Sample` contents for round-trip tests.
//!
//! [`SampleData`] is an owned mirror of the `Sample` table: it can be generated
//! from a seeded [`fastrand::Rng`], written through the generated-style
//! builder API and read back from a finished buffer, so tests compare whole
//! values instead of field by field.

use tablebuf::{Builder, Offset};
use tablebuf_common::Result;

use crate::{
    namespace_a::{
        SecondTableInA, SecondTableInAArgs, TableInFirstNS, TableInFirstNSArgs,
        namespace_b::{EnumInNestedNS, StructInNestedNS},
    },
    sample::{Payload, PayloadValue, Sample, SampleArgs, SampleOffset},
};

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadData {
    /// A `TableInFirstNS` carrying only its enum and struct.
    First {
        kind: EnumInNestedNS,
        origin: Option<(i32, i32)>,
    },
    /// An empty `SecondTableInA`.
    Second,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleData {
    pub name: String,
    pub id: u32,
    pub ratio: f64,
    pub enabled: bool,
    pub kind: EnumInNestedNS,
    pub tags: Option<Vec<String>>,
    pub scores: Option<Vec<i16>>,
    pub origin: Option<(i32, i32)>,
    pub payload: Option<PayloadData>,
    pub raw: Option<Vec<u8>>,
    pub points: Option<Vec<(i32, i32)>>,
}

impl SampleData {
    /// Generates a sample where every optional field is present with
    /// probability one half and scalars are often equal to their defaults.
    pub fn random(rng: &mut fastrand::Rng) -> SampleData {
        let len = rng.usize(0..24);
        SampleData {
            name: random_string(rng, len),
            id: if rng.bool() { 0 } else { rng.u32(..) },
            ratio: if rng.bool() {
                Sample::DEFAULT_RATIO
            } else {
                rng.f64() * 1000.0
            },
            enabled: rng.bool(),
            kind: *rng.choice(EnumInNestedNS::ENUM_VALUES).unwrap_or(&EnumInNestedNS::A),
            tags: rng.bool().then(|| {
                (0..rng.usize(0..6))
                    .map(|_| {
                        let len = rng.usize(0..12);
                        random_string(rng, len)
                    })
                    .collect()
            }),
            scores: rng
                .bool()
                .then(|| (0..rng.usize(0..16)).map(|_| rng.i16(..)).collect()),
            origin: rng.bool().then(|| (rng.i32(..), rng.i32(..))),
            payload: match rng.u8(0..3) {
                0 => None,
                1 => Some(PayloadData::First {
                    kind: EnumInNestedNS(rng.i8(0..3)),
                    origin: rng.bool().then(|| (rng.i32(..), rng.i32(..))),
                }),
                _ => Some(PayloadData::Second),
            },
            raw: rng
                .bool()
                .then(|| (0..rng.usize(0..32)).map(|_| rng.u8(..)).collect()),
            points: rng.bool().then(|| {
                (0..rng.usize(0..5))
                    .map(|_| (rng.i32(..), rng.i32(..)))
                    .collect()
            }),
        }
    }

    /// Writes this sample bottom-up and returns the `Sample` table offset.
    pub fn write(&self, builder: &mut Builder) -> Result<Offset<SampleOffset>> {
        let payload = match &self.payload {
            None => None,
            Some(PayloadData::First { kind, origin }) => {
                let args = TableInFirstNSArgs {
                    foo_table: None,
                    foo_enum: *kind,
                    foo_struct: origin.map(|(a, b)| StructInNestedNS::new(a, b)),
                };
                Some(PayloadValue::TableInFirstNS(TableInFirstNS::create(
                    builder, &args,
                )?))
            }
            Some(PayloadData::Second) => Some(PayloadValue::SecondTableInA(
                SecondTableInA::create(builder, &SecondTableInAArgs::default())?,
            )),
        };
        let tags = match &self.tags {
            Some(tags) => {
                let offsets = tags
                    .iter()
                    .map(|tag| builder.create_shared_string(tag))
                    .collect::<Result<Vec<_>>>()?;
                Some(builder.create_vector_of_offsets(&offsets)?)
            }
            None => None,
        };
        let scores = self
            .scores
            .as_deref()
            .map(|scores| builder.create_vector(scores))
            .transpose()?;
        let raw = self
            .raw
            .as_deref()
            .map(|raw| builder.create_vector(raw))
            .transpose()?;
        let points = self
            .points
            .as_deref()
            .map(|points| {
                let points = points
                    .iter()
                    .map(|&(a, b)| StructInNestedNS::new(a, b))
                    .collect::<Vec<_>>();
                builder.create_vector_of_structs(&points)
            })
            .transpose()?;
        let name = builder.create_string(&self.name)?;

        Sample::create(
            builder,
            &SampleArgs {
                name: Some(name),
                id: self.id,
                ratio: self.ratio,
                enabled: self.enabled,
                kind: self.kind,
                tags,
                scores,
                origin: self.origin.map(|(a, b)| StructInNestedNS::new(a, b)),
                payload,
                raw,
                points,
            },
        )
    }

    /// Reads a sample back through the generated-style accessors.
    pub fn read(sample: Sample<'_>) -> Result<SampleData> {
        let payload = match sample.payload_type()? {
            Payload::TABLE_IN_FIRST_NS => match sample.payload_as_table_in_first_ns()? {
                Some(first) => Some(PayloadData::First {
                    kind: first.foo_enum()?,
                    origin: first.foo_struct()?.map(|s| (s.a(), s.b())),
                }),
                None => None,
            },
            Payload::SECOND_TABLE_IN_A => sample
                .payload_as_second_table_in_a()?
                .map(|_| PayloadData::Second),
            _ => None,
        };
        let tags = match sample.tags()? {
            Some(tags) => Some(
                tags.iter()
                    .map(|tag| tag.map(str::to_string))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        let points = match sample.points()? {
            Some(points) => Some(
                points
                    .iter()
                    .map(|point| point.map(|s| (s.a(), s.b())))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        Ok(SampleData {
            name: sample.name()?.unwrap_or_default().to_string(),
            id: sample.id()?,
            ratio: sample.ratio()?,
            enabled: sample.enabled()?,
            kind: sample.kind()?,
            tags,
            scores: sample.scores()?.map(|s| s.to_vec()).transpose()?,
            origin: sample.origin()?.map(|s| (s.a(), s.b())),
            payload,
            raw: sample.raw()?.map(<[u8]>::to_vec),
            points,
        })
    }
}

fn random_string(rng: &mut fastrand::Rng, len: usize) -> String {
    (0..len)
        .map(|_| match rng.u8(0..8) {
            0 => rng.char('α'..='ω'),
            _ => rng.alphanumeric(),
        })
        .collect()
}
