/// Interns the fields and terms a query touches so execution state can be
/// indexed by small integers instead of strings.
#[derive(Debug, Default)]
pub struct QueryContext {
    pub fields: Vec<QueryField>,
}

#[derive(Debug)]
pub struct QueryField {
    pub name: String,
    pub terms: Vec<Vec<u8>>,
}

impl QueryContext {
    /// Returns (field_index, term_index), registering either on first use.
    pub fn register_term(&mut self, field_name: &str, term: &[u8]) -> (usize, usize) {
        for (field_index, field) in self.fields.iter_mut().enumerate() {
            if field.name == field_name {
                for (term_index, known) in field.terms.iter().enumerate() {
                    if known.as_slice() == term {
                        return (field_index, term_index);
                    }
                }

                field.terms.push(term.to_vec());
                return (field_index, field.terms.len() - 1);
            }
        }

        self.fields.push(QueryField {
            name: field_name.to_string(),
            terms: vec![term.to_vec()],
        });
        (self.fields.len() - 1, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_fields_and_terms() {
        let mut context = QueryContext::default();
        assert_eq!(context.register_term("body", b"hello"), (0, 0));
        assert_eq!(context.register_term("body", b"world"), (0, 1));
        assert_eq!(context.register_term("title", b"hello"), (1, 0));
        // Repeats resolve to the same indices.
        assert_eq!(context.register_term("body", b"hello"), (0, 0));
        assert_eq!(context.register_term("title", b"hello"), (1, 0));
    }
}
