#![no_main]

use libfuzzer_sys::fuzz_target;
use ilscope::prelude::*;

fuzz_target!(|data: &[u8]| {
    let method = MethodDef {
        name: "Fuzz".to_string(),
        declaring_type: "Program".to_string(),
        flags: 0x0096,
        return_type: "void".to_string(),
        body: Some(MethodIl::Raw(data.to_vec())),
        ..MethodDef::default()
    };
    let member = MemberDef::from(method);
    let context = DecompilationContext::default();

    for language in [IlLanguage::flat(), IlLanguage::structured()] {
        let mut sink = StringSink::new();
        let _ = language.decompile(&member, &mut sink, &context);
    }
});
