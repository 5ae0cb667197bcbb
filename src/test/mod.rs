//! Helper functions for building members in unit tests

use std::sync::Arc;

use crate::metadata::{
    members::{MethodDef, MethodIl, TypeDef},
    method::{ExceptionHandler, ExceptionHandlerFlags},
    token::Token,
};

/// `public hidebysig static`
pub const PUBLIC_STATIC: u16 = 0x0096;

// Helper function to create a static void method `Program::<name>` with bare code
pub fn create_method(name: &str, code: Vec<u8>) -> Arc<MethodDef> {
    create_method_with_clauses(name, code, Vec::new())
}

// Helper function to create a static void method with exception clauses
pub fn create_method_with_clauses(
    name: &str,
    code: Vec<u8>,
    clauses: Vec<ExceptionHandler>,
) -> Arc<MethodDef> {
    Arc::new(MethodDef {
        token: Token::new(0x0600_0001),
        name: name.to_string(),
        declaring_type: "Program".to_string(),
        flags: PUBLIC_STATIC,
        return_type: "void".to_string(),
        body: Some(MethodIl::Code {
            code,
            max_stack: 8,
            init_locals: false,
            clauses,
        }),
        ..MethodDef::default()
    })
}

// Helper function to create a private top-level type `name` holding `methods`
pub fn create_type(name: &str, methods: Vec<Arc<MethodDef>>) -> Arc<TypeDef> {
    Arc::new(TypeDef {
        token: Token::new(0x0200_0002),
        name: name.to_string(),
        full_name: name.to_string(),
        methods,
        ..TypeDef::default()
    })
}

// Helper function to create a catch clause for `class_token`
pub fn create_catch(
    try_offset: u32,
    try_length: u32,
    handler_offset: u32,
    handler_length: u32,
    class_token: u32,
) -> ExceptionHandler {
    ExceptionHandler {
        flags: ExceptionHandlerFlags::EXCEPTION,
        try_offset,
        try_length,
        handler_offset,
        handler_length,
        filter_offset: class_token,
    }
}
