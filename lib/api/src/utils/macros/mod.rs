/// Counts a list of identifiers at compile time.
macro_rules! count_idents {
    ( $($idents:ident),* ) => {{
        #[allow(dead_code, non_camel_case_types)]
        enum Idents { $($idents,)* __CountIdentsLast }
        const COUNT: usize = Idents::__CountIdentsLast as usize;
        COUNT
    }};
}

/// Invokes `$mac` once per arity, from 0 to 16 parameters.
macro_rules! for_each_arity {
    ( $mac:ident ) => {
        $mac!();
        $mac!(A1);
        $mac!(A1, A2);
        $mac!(A1, A2, A3);
        $mac!(A1, A2, A3, A4);
        $mac!(A1, A2, A3, A4, A5);
        $mac!(A1, A2, A3, A4, A5, A6);
        $mac!(A1, A2, A3, A4, A5, A6, A7);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15);
        $mac!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15, A16);
    };
}
