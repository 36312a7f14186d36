//! Support code generated codecs call into.
//!
//! Generated files refer to everything here through fully qualified paths
//! (`::rqlgen::runtime::Codec`, ...), so they can be `include!`d anywhere.
mod convert;
mod datum;
mod error;

pub use chrono;

pub use convert::{FromCanonical, ToCanonical};
pub use datum::{Datum, Object, Timestamp};
pub use error::CodecError;

/// A record that converts to and from the untyped tree.
pub trait Codec {
    fn encode(&self) -> Result<Datum, CodecError>;

    /// Decode `datum` into `self`. `Datum::Null` leaves `self` untouched.
    /// Not transactional: fields assigned before an error stay assigned.
    fn decode(&mut self, datum: Datum) -> Result<(), CodecError>;
}

/// Re-specialization hook for records with a discriminator field.
///
/// Generated `decode` calls `mutate` right after the discriminator field is
/// processed and before any later field is decoded.
pub trait Polymorphic {
    fn mutate(&mut self);
}

/// `None` is the absent record: it encodes to `Datum::Null`, and decoding
/// non-null data into it allocates a default record first.
impl<T: Codec + Default> Codec for Option<T> {
    fn encode(&self) -> Result<Datum, CodecError> {
        match self {
            None => Ok(Datum::Null),
            Some(record) => record.encode(),
        }
    }

    fn decode(&mut self, datum: Datum) -> Result<(), CodecError> {
        if datum.is_null() {
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode(datum)
    }
}

impl<T: Codec + ?Sized> Codec for Box<T> {
    fn encode(&self) -> Result<Datum, CodecError> {
        (**self).encode()
    }

    fn decode(&mut self, datum: Datum) -> Result<(), CodecError> {
        (**self).decode(datum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        hits: u32,
    }

    impl Codec for Counter {
        fn encode(&self) -> Result<Datum, CodecError> {
            Ok(Datum::Number(f64::from(self.hits)))
        }

        fn decode(&mut self, datum: Datum) -> Result<(), CodecError> {
            let n = datum
                .into_number()
                .map_err(|got| CodecError::conversion(got.kind(), "u32", "Counter", "hits"))?;
            self.hits = n as u32;
            Ok(())
        }
    }

    #[test]
    fn absent_record_encodes_to_null() {
        let absent: Option<Counter> = None;
        assert_eq!(absent.encode(), Ok(Datum::Null));
    }

    #[test]
    fn decoding_null_leaves_the_receiver_alone() {
        let mut absent: Option<Counter> = None;
        absent.decode(Datum::Null).unwrap();
        assert_eq!(absent, None);

        let mut present = Some(Counter { hits: 3 });
        present.decode(Datum::Null).unwrap();
        assert_eq!(present, Some(Counter { hits: 3 }));
    }

    #[test]
    fn absent_receiver_is_allocated_before_decoding() {
        let mut absent: Option<Box<Counter>> = None;
        absent.decode(Datum::Number(9.0)).unwrap();
        assert_eq!(absent, Some(Box::new(Counter { hits: 9 })));
    }
}
