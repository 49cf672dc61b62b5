//! Typed extraction of a single JSON value straight from the token stream.
//!
//! [`Extractor`] is a `serde` deserializer that pulls tokens from the
//! [`Tokenizer`] until the value at the cursor is complete, without building
//! an intermediate tree. On top of the usual JSON mapping it coalesces
//! `null`: a non-optional target receives its zero value (`0`, `""`,
//! `false`, an empty collection, a struct of zero fields), an `Option`
//! receives `None`. Struct fields missing from an object are zeroed the same
//! way, so no field is ever required.
use core::fmt;
use std::io::Read;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess,
    SeqAccess, VariantAccess, Visitor,
};

use crate::{
    error::{SyntaxError, TokenError},
    tokenizer::{Token, Tokenizer},
};

/// Failure while extracting: either the input itself is broken, or it does
/// not fit the requested type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DeError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("{0}")]
    Custom(String),
}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

/// Decodes the value at the cursor into `T`, leaving the tokenizer right
/// after it.
pub(crate) fn extract<T, R>(tokens: &mut Tokenizer<R>) -> Result<T, DeError>
where
    T: DeserializeOwned,
    R: Read,
{
    T::deserialize(&mut Extractor { tokens })
}

pub(crate) struct Extractor<'t, R> {
    tokens: &'t mut Tokenizer<R>,
}

impl<R: Read> Extractor<'_, R> {
    /// Consumes a `null` at the cursor, if there is one.
    fn take_null(&mut self) -> Result<bool, DeError> {
        if *self.tokens.peek_token()? == Token::Null {
            self.tokens.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the closing delimiter once the visitor is done with a
    /// container.
    fn finish_container(&mut self, what: &str) -> Result<(), DeError> {
        if self.tokens.more()? {
            return Err(de::Error::custom(format_args!(
                "{what} has more entries than expected"
            )));
        }
        self.tokens.next_token()?;
        Ok(())
    }

    fn unexpected(&self, token: &Token) -> DeError {
        self.tokens
            .error(SyntaxError::UnexpectedToken(token.describe()))
            .into()
    }
}

fn visit_number<'de, V: Visitor<'de>>(literal: &str, visitor: V) -> Result<V::Value, DeError> {
    if !literal.contains(['.', 'e', 'E']) {
        if let Ok(n) = literal.parse::<u64>() {
            return visitor.visit_u64(n);
        }
        if let Ok(n) = literal.parse::<i64>() {
            return visitor.visit_i64(n);
        }
    }
    let n: f64 = literal
        .parse()
        .map_err(|err: core::num::ParseFloatError| DeError::Custom(err.to_string()))?;
    visitor.visit_f64(n)
}

macro_rules! zero_on_null {
    ($($method:ident => $visit:ident($zero:expr)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
                if self.take_null()? {
                    visitor.$visit($zero)
                } else {
                    self.deserialize_any(visitor)
                }
            }
        )*
    };
}

impl<'de, R: Read> Deserializer<'de> for &mut Extractor<'_, R> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.tokens.next_token()? {
            Token::Null => visitor.visit_unit(),
            Token::Boolean(b) => visitor.visit_bool(b),
            Token::Number(literal) => visit_number(&literal, visitor),
            Token::String(s) => visitor.visit_string(s),
            Token::BeginArray => {
                let value = visitor.visit_seq(Entries { de: &mut *self })?;
                self.finish_container("array")?;
                Ok(value)
            }
            Token::BeginObject => {
                let value = visitor.visit_map(Entries { de: &mut *self })?;
                self.finish_container("object")?;
                Ok(value)
            }
            token => Err(self.unexpected(&token)),
        }
    }

    zero_on_null! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i8(0),
        deserialize_i16 => visit_i16(0),
        deserialize_i32 => visit_i32(0),
        deserialize_i64 => visit_i64(0),
        deserialize_u8 => visit_u8(0),
        deserialize_u16 => visit_u16(0),
        deserialize_u32 => visit_u32(0),
        deserialize_u64 => visit_u64(0),
        deserialize_f32 => visit_f32(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_str => visit_str(""),
        deserialize_string => visit_string(String::new()),
        deserialize_seq => visit_seq(Empty),
        deserialize_map => visit_map(Empty),
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if self.take_null()? {
            visitor.visit_unit()
        } else {
            self.deserialize_any(visitor)
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.tokens.peek_token()? {
            Token::Null => {
                self.tokens.next_token()?;
                visitor.visit_byte_buf(Vec::new())
            }
            Token::String(_) => match self.tokens.next_token()? {
                Token::String(s) => visitor.visit_byte_buf(s.into_bytes()),
                token => Err(self.unexpected(&token)),
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if self.take_null()? {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, DeError> {
        if self.take_null()? {
            visitor.visit_seq(Zeros(len))
        } else {
            self.deserialize_seq(visitor)
        }
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.tokens.peek_token()? {
            Token::Null => {
                self.tokens.next_token()?;
                visitor.visit_map(Missing::new(fields))
            }
            Token::BeginObject => {
                self.tokens.next_token()?;
                let value = visitor.visit_map(Members {
                    de: &mut *self,
                    missing: Missing::new(fields),
                    filling: false,
                })?;
                self.finish_container("object")?;
                Ok(value)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.tokens.peek_token()? {
            Token::Null => {
                self.tokens.next_token()?;
                Zero.deserialize_enum(name, variants, visitor)
            }
            Token::String(_) => match self.tokens.next_token()? {
                Token::String(variant) => {
                    visitor.visit_enum(IntoDeserializer::<DeError>::into_deserializer(variant))
                }
                token => Err(self.unexpected(&token)),
            },
            Token::BeginObject => {
                self.tokens.next_token()?;
                let value = visitor.visit_enum(Variant { de: &mut *self })?;
                self.finish_container("enum object")?;
                Ok(value)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.tokens.skip_value()?;
        visitor.visit_unit()
    }
}

/// Elements of an array or members of an object, read until the tokenizer
/// reports the container exhausted.
struct Entries<'a, 't, R> {
    de: &'a mut Extractor<'t, R>,
}

impl<'de, R: Read> SeqAccess<'de> for Entries<'_, '_, R> {
    type Error = DeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DeError> {
        if !self.de.tokens.more()? {
            return Ok(None);
        }
        seed.deserialize(&mut *self.de).map(Some)
    }
}

impl<'de, R: Read> MapAccess<'de> for Entries<'_, '_, R> {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        if !self.de.tokens.more()? {
            return Ok(None);
        }
        match self.de.tokens.next_token()? {
            Token::PropertyName(key) => seed
                .deserialize(IntoDeserializer::<DeError>::into_deserializer(key))
                .map(Some),
            token => Err(self.de.unexpected(&token)),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        seed.deserialize(&mut *self.de)
    }
}

/// Members of an object decoded into a struct. Once the object runs out,
/// the fields it never named are handed to the visitor as zero values.
struct Members<'a, 't, R> {
    de: &'a mut Extractor<'t, R>,
    missing: Missing,
    filling: bool,
}

impl<'de, R: Read> MapAccess<'de> for Members<'_, '_, R> {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        if !self.filling {
            if self.de.tokens.more()? {
                return match self.de.tokens.next_token()? {
                    Token::PropertyName(key) => {
                        self.missing.mark_seen(&key);
                        seed.deserialize(IntoDeserializer::<DeError>::into_deserializer(key))
                            .map(Some)
                    }
                    token => Err(self.de.unexpected(&token)),
                };
            }
            self.filling = true;
        }
        self.missing.next_key_seed(seed)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        if self.filling {
            self.missing.next_value_seed(seed)
        } else {
            seed.deserialize(&mut *self.de)
        }
    }
}

/// What a `null` container decodes as.
struct Empty;

impl<'de> SeqAccess<'de> for Empty {
    type Error = DeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        _seed: T,
    ) -> Result<Option<T::Value>, DeError> {
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

impl<'de> MapAccess<'de> for Empty {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        _seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, _seed: V) -> Result<V::Value, DeError> {
        Err(de::Error::custom("value requested from an empty map"))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

/// `{"Variant": content}`, with the opening brace already consumed.
struct Variant<'a, 't, R> {
    de: &'a mut Extractor<'t, R>,
}

impl<'de, R: Read> EnumAccess<'de> for Variant<'_, '_, R> {
    type Error = DeError;
    type Variant = Self;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Self), DeError> {
        if !self.de.tokens.more()? {
            return Err(de::Error::invalid_length(0, &"an object with a single key"));
        }
        match self.de.tokens.next_token()? {
            Token::PropertyName(key) => {
                let variant = seed.deserialize(IntoDeserializer::<DeError>::into_deserializer(key))?;
                Ok((variant, self))
            }
            token => Err(self.de.unexpected(&token)),
        }
    }
}

impl<'de, R: Read> VariantAccess<'de> for Variant<'_, '_, R> {
    type Error = DeError;

    fn unit_variant(self) -> Result<(), DeError> {
        de::Deserialize::deserialize(&mut *self.de)
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, DeError> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DeError> {
        self.de.deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.de.deserialize_struct("", fields, visitor)
    }
}

/// Struct fields not present in the input, each paired with a zero value.
struct Missing {
    fields: &'static [&'static str],
    seen: Vec<bool>,
    next: usize,
}

impl Missing {
    fn new(fields: &'static [&'static str]) -> Self {
        Self {
            fields,
            seen: vec![false; fields.len()],
            next: 0,
        }
    }

    fn mark_seen(&mut self, key: &str) {
        if let Some(i) = self.fields.iter().position(|field| *field == key) {
            self.seen[i] = true;
        }
    }
}

impl<'de> MapAccess<'de> for Missing {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        while self.seen.get(self.next).copied() == Some(true) {
            self.next += 1;
        }
        let Some(&field) = self.fields.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        seed.deserialize(IntoDeserializer::<DeError>::into_deserializer(field))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        seed.deserialize(Zero)
    }
}

/// `len` zero elements, for a `null` tuple.
struct Zeros(usize);

impl<'de> SeqAccess<'de> for Zeros {
    type Error = DeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DeError> {
        if self.0 == 0 {
            return Ok(None);
        }
        self.0 -= 1;
        seed.deserialize(Zero).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0)
    }
}

macro_rules! zero {
    ($($method:ident => $visit:ident($zero:expr)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
                visitor.$visit($zero)
            }
        )*
    };
}

/// Produces the zero value of whatever type asks: what a `null` or an
/// absent field decodes as. Enums take their first variant.
struct Zero;

impl<'de> Deserializer<'de> for Zero {
    type Error = DeError;

    zero! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i8(0),
        deserialize_i16 => visit_i16(0),
        deserialize_i32 => visit_i32(0),
        deserialize_i64 => visit_i64(0),
        deserialize_u8 => visit_u8(0),
        deserialize_u16 => visit_u16(0),
        deserialize_u32 => visit_u32(0),
        deserialize_u64 => visit_u64(0),
        deserialize_f32 => visit_f32(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_str => visit_str(""),
        deserialize_string => visit_string(String::new()),
        deserialize_identifier => visit_str(""),
        deserialize_bytes => visit_byte_buf(Vec::new()),
        deserialize_byte_buf => visit_byte_buf(Vec::new()),
        deserialize_seq => visit_seq(Empty),
        deserialize_map => visit_map(Empty),
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_none()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(Zero)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_seq(Zeros(len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_seq(Zeros(len))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_map(Missing::new(fields))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        let Some(&first) = variants.first() else {
            return Err(de::Error::custom(format_args!("enum {name} has no variants")));
        };
        visitor.visit_enum(FirstVariant(first))
    }
}

/// The first variant of an enum, with zero content.
struct FirstVariant(&'static str);

impl<'de> EnumAccess<'de> for FirstVariant {
    type Error = DeError;
    type Variant = Self;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Self), DeError> {
        let variant = seed.deserialize(IntoDeserializer::<DeError>::into_deserializer(self.0))?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for FirstVariant {
    type Error = DeError;

    fn unit_variant(self) -> Result<(), DeError> {
        Ok(())
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, DeError> {
        seed.deserialize(Zero)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_seq(Zeros(len))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_map(Missing::new(fields))
    }
}
