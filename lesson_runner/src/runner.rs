//! Lesson runner: four self-contained demonstrations, printed in order.
//!
//! Each lesson builds its records from literals, applies one operation and
//! prints the records it wants the reader to look at. Records are printed
//! in console format, one per `writeln!`, and returned for inspection.
//!
//! Lesson order:
//!   1. in-place mutation          prints sandra
//!   2. shallow-copy update        prints dorianGray
//!   3. shallow copy, nested data  prints josh, shallowJosh
//!   4. deep copy, nested data     prints josh, deepJosh

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info, info_span};

use record_semantics::inspect::{inspect_serialize, InspectOptions};
use record_semantics::{
    deep_copy, shallow_copy, update_age, update_age_immutable, Employee, Occupation, Person,
};

use crate::error::LessonError;

/// The demonstrations, in the order `run_all` executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lesson {
    InPlaceMutation,
    ImmutableUpdate,
    ShallowCopyNested,
    DeepCopyNested,
}

impl Lesson {
    pub const ALL: [Lesson; 4] = [
        Lesson::InPlaceMutation,
        Lesson::ImmutableUpdate,
        Lesson::ShallowCopyNested,
        Lesson::DeepCopyNested,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Lesson::InPlaceMutation => "Mutating example",
            Lesson::ImmutableUpdate => "Ensuring immutability",
            Lesson::ShallowCopyNested => "Shallow copy of a nested record",
            Lesson::DeepCopyNested => "Deep copy of a nested record",
        }
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Every record the lessons built, in its final state.
#[derive(Debug, Clone)]
pub struct LessonReport {
    pub sandra: Person,
    pub dorian_gray: Person,
    pub older_dorian_gray: Person,
    pub josh: Employee,
    pub shallow_josh: Employee,
    pub deep_josh: Employee,
}

/// Runs lessons against an output sink.
pub struct LessonRunner<W: Write> {
    out: W,
    options: InspectOptions,
    printed: usize,
}

impl<W: Write> LessonRunner<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, InspectOptions::default())
    }

    pub fn with_options(out: W, options: InspectOptions) -> Self {
        Self {
            out,
            options,
            printed: 0,
        }
    }

    /// Number of records printed so far.
    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Hand back the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print<T: Serialize>(&mut self, label: &str, record: &T) -> Result<(), LessonError> {
        let rendered = inspect_serialize(record, &self.options)?;
        writeln!(self.out, "{}", rendered)?;
        self.printed += 1;
        debug!(label, "printed record");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lessons
    // ---------------------------------------------------------------------

    /// Pass a record to a function that mutates it; the caller sees the change.
    pub fn in_place_mutation(&mut self) -> Result<Person, LessonError> {
        let _span = info_span!("lesson", title = Lesson::InPlaceMutation.title()).entered();
        info!("lesson started");

        let mut sandra = Person::new("sandra", 22);
        update_age(&mut sandra);
        self.print("sandra", &sandra)?;
        info!(printed = self.printed, "lesson finished");
        Ok(sandra)
    }

    /// Pass a record to a function that copies before changing; the caller's
    /// record is untouched.
    pub fn immutable_update(&mut self) -> Result<(Person, Person), LessonError> {
        let _span = info_span!("lesson", title = Lesson::ImmutableUpdate.title()).entered();
        info!("lesson started");

        let dorian_gray = Person::new("dorianGray", 50);
        let older = update_age_immutable(&dorian_gray);
        self.print("dorianGray", &dorian_gray)?;
        debug!(age = older.age, "the copy aged instead");
        info!(printed = self.printed, "lesson finished");
        Ok((dorian_gray, older))
    }

    /// A shallow copy still shares its nested occupation with the source.
    pub fn shallow_copy_nested(&mut self) -> Result<(Employee, Employee), LessonError> {
        let _span = info_span!("lesson", title = Lesson::ShallowCopyNested.title()).entered();
        info!("lesson started");

        let josh = Employee::new(
            "josh",
            30,
            Occupation::new(
                "Senior Analytics Implementation Consultant II",
                "Blast Analytics",
            ),
        );
        let shallow_josh = shallow_copy(&josh);
        shallow_josh.set_title("Analytics Strategist");

        self.print("josh", &josh)?;
        self.print("shallowJosh", &shallow_josh)?;
        info!(printed = self.printed, "lesson finished");
        Ok((josh, shallow_josh))
    }

    /// A deep copy shares nothing; changing it leaves `josh` alone.
    pub fn deep_copy_nested(&mut self, josh: &Employee) -> Result<Employee, LessonError> {
        let _span = info_span!("lesson", title = Lesson::DeepCopyNested.title()).entered();
        info!("lesson started");

        let deep_josh = deep_copy(josh)?;
        deep_josh.set_title("Software Developer");

        self.print("josh", josh)?;
        self.print("deepJosh", &deep_josh)?;
        info!(printed = self.printed, "lesson finished");
        Ok(deep_josh)
    }

    /// Run every lesson in order. The deep-copy lesson copies the `josh`
    /// left behind by the shallow-copy lesson.
    pub fn run_all(&mut self) -> Result<LessonReport, LessonError> {
        let sandra = self.in_place_mutation()?;
        let (dorian_gray, older_dorian_gray) = self.immutable_update()?;
        let (josh, shallow_josh) = self.shallow_copy_nested()?;
        let deep_josh = self.deep_copy_nested(&josh)?;
        self.out.flush()?;

        info!(lessons = Lesson::ALL.len(), printed = self.printed, "all lessons finished");
        Ok(LessonReport {
            sandra,
            dorian_gray,
            older_dorian_gray,
            josh,
            shallow_josh,
            deep_josh,
        })
    }
}
