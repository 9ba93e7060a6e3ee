use crate::column::ColumnKind;
use crate::frame::Frame;
use crate::types::ElementType;

/// Structural schema of one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnSchema {
    Value(ElementType),
    Group(FrameSchema),
    Frame { schema: FrameSchema, nullable: bool },
}

impl ColumnSchema {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnSchema::Value(_) => ColumnKind::Value,
            ColumnSchema::Group(_) => ColumnKind::Group,
            ColumnSchema::Frame { .. } => ColumnKind::Frame,
        }
    }

    /// Whether a column of this schema may be filled entirely with empty cells.
    pub fn is_nullable(&self) -> bool {
        match self {
            ColumnSchema::Value(t) => t.nullable,
            ColumnSchema::Group(schema) => schema.iter().all(|(_, c)| c.is_nullable()),
            ColumnSchema::Frame { nullable, .. } => *nullable,
        }
    }

    fn union(&self, other: &ColumnSchema) -> ColumnSchema {
        match (self, other) {
            (ColumnSchema::Value(a), ColumnSchema::Value(b)) => ColumnSchema::Value(a.common(*b)),
            (ColumnSchema::Group(a), ColumnSchema::Group(b)) => ColumnSchema::Group(a.union(b)),
            (
                ColumnSchema::Frame {
                    schema: a,
                    nullable: na,
                },
                ColumnSchema::Frame {
                    schema: b,
                    nullable: nb,
                },
            ) => ColumnSchema::Frame {
                schema: a.union(b),
                nullable: *na || *nb,
            },
            // Mixed kinds degrade to the first one; conformance reports the mismatch.
            _ => self.clone(),
        }
    }

    fn as_missing(&self) -> ColumnSchema {
        match self {
            ColumnSchema::Value(t) => ColumnSchema::Value(t.with_nullable(true)),
            ColumnSchema::Group(schema) => ColumnSchema::Group(FrameSchema::new(
                schema
                    .iter()
                    .map(|(n, c)| (n.clone(), c.as_missing()))
                    .collect(),
            )),
            ColumnSchema::Frame { schema, .. } => ColumnSchema::Frame {
                schema: schema.clone(),
                nullable: true,
            },
        }
    }
}

/// Ordered structural schema of a frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameSchema {
    columns: Vec<(String, ColumnSchema)>,
}

impl FrameSchema {
    pub fn new(columns: Vec<(String, ColumnSchema)>) -> Self {
        Self { columns }
    }

    pub fn value(mut self, name: impl Into<String>, element_type: ElementType) -> Self {
        self.columns
            .push((name.into(), ColumnSchema::Value(element_type)));
        self
    }

    pub fn group(mut self, name: impl Into<String>, schema: FrameSchema) -> Self {
        self.columns.push((name.into(), ColumnSchema::Group(schema)));
        self
    }

    pub fn frame(mut self, name: impl Into<String>, schema: FrameSchema, nullable: bool) -> Self {
        self.columns
            .push((name.into(), ColumnSchema::Frame { schema, nullable }));
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ColumnSchema)> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Column-wise union: shared columns merge their schemas, columns present on one side only
    /// become nullable.
    pub fn union(&self, other: &FrameSchema) -> FrameSchema {
        let mut columns: Vec<(String, ColumnSchema)> = self
            .columns
            .iter()
            .map(|(name, schema)| {
                let merged = match other.get(name) {
                    Some(theirs) => schema.union(theirs),
                    None => schema.as_missing(),
                };
                (name.clone(), merged)
            })
            .collect();
        for (name, schema) in &other.columns {
            if self.get(name).is_none() {
                columns.push((name.clone(), schema.as_missing()));
            }
        }
        FrameSchema { columns }
    }
}

/// Schema shared by a set of frames, as used for frame columns.
pub fn union_of_frames<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> FrameSchema {
    frames
        .into_iter()
        .map(Frame::schema)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default()
}
